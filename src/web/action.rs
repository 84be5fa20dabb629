use std::sync::Arc;

use salvo::prelude::*;
use tracing::{Instrument, error, info_span, warn};
use uuid::Uuid;

use crate::actions::{ActionPayload, ActionService};
use crate::web::metrics::Metrics;

/// `POST /extensions/slack/action/`: Slack's interactive-component callback.
pub struct SlackActionHandler {
    service: Arc<ActionService>,
}

impl SlackActionHandler {
    pub fn new(service: Arc<ActionService>) -> Self {
        Self { service }
    }
}

#[handler]
impl SlackActionHandler {
    async fn handle(&self, req: &mut Request, res: &mut Response) {
        Metrics::action_received();

        let raw = match req.form::<String>("payload").await {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                Metrics::request_rejected();
                warn!("slack action request without a payload field");
                res.status_code(StatusCode::BAD_REQUEST);
                return;
            }
        };
        let payload = match ActionPayload::parse(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                Metrics::request_rejected();
                warn!("rejecting slack action: {}", e);
                res.status_code(StatusCode::BAD_REQUEST);
                return;
            }
        };

        let span = info_span!(
            "slack_action",
            request_id = %Uuid::new_v4(),
            team_id = %payload.team.id,
            user_id = %payload.user.id,
            kind = %payload.kind,
        );
        let result = self.service.handle(&payload).instrument(span).await;

        match result {
            Ok(reply) => {
                res.status_code(StatusCode::OK);
                if let Some(body) = reply.to_json() {
                    res.render(Json(body));
                }
            }
            Err(err) => {
                let status = err.status_code();
                if status.is_server_error() {
                    error!("slack action failed: {}", err);
                } else {
                    Metrics::request_rejected();
                    warn!("rejecting slack action: {}", err);
                }
                res.status_code(status);
            }
        }
    }
}
