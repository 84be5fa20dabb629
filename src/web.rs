use std::sync::Arc;

use anyhow::Result;
use salvo::prelude::*;
use tracing::info;

use crate::actions::ActionService;
use crate::config::Config;

mod action;
mod health;
pub mod metrics;

use action::SlackActionHandler;
use health::{get_status, health_check};
use metrics::{Metrics, metrics_endpoint};

pub struct WebServer {
    config: Arc<Config>,
    service: Arc<ActionService>,
}

impl WebServer {
    pub fn new(config: Arc<Config>, service: Arc<ActionService>) -> Self {
        Self { config, service }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        info!("starting web server on {}", bind_addr);
        Metrics::mark_started();

        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor)
            .serve(root_router(self.service.clone()))
            .await;

        Ok(())
    }
}

pub fn root_router(service: Arc<ActionService>) -> Router {
    Router::new()
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("status").get(get_status))
        .push(Router::with_path("metrics").get(metrics_endpoint))
        .push(
            Router::with_path("extensions/slack/action").post(SlackActionHandler::new(service)),
        )
}
