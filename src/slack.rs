use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SlackConfig;

pub mod attachment;
pub mod dialog;

pub use self::attachment::{ACTIONED_ISSUE_COLOR, Attachment};
pub use self::dialog::{Dialog, RESOLVE_TYPE_FIELD, resolve_dialog};

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("request to {target} failed: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{target} returned status {status}")]
    Status { target: String, status: u16 },

    #[error("Slack API {method} returned ok=false: {code}")]
    Api { method: String, code: String },

    #[error("response url {0} does not match the allowed pattern")]
    ResponseUrlRefused(String),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound calls made on behalf of an action: opening dialogs and
/// answering through a response url.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    api_base_url: String,
    response_url_pattern: Regex,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("slack-issue-actions/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("failed to construct HTTP client")?;
        let response_url_pattern = Regex::new(&config.response_url_pattern)
            .context("invalid slack.response_url_pattern")?;

        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            response_url_pattern,
        })
    }

    pub async fn open_dialog(
        &self,
        bot_token: &str,
        trigger_id: &str,
        dialog: &Dialog,
    ) -> Result<(), SlackError> {
        let dialog_json = serde_json::to_string(dialog)?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("token", bot_token)
            .append_pair("trigger_id", trigger_id)
            .append_pair("dialog", &dialog_json)
            .finish();

        self.slack_api_post("dialog.open", body).await?;
        debug!("opened dialog for trigger {}", trigger_id);
        Ok(())
    }

    pub fn is_allowed_response_url(&self, url: &str) -> bool {
        self.response_url_pattern.is_match(url)
    }

    pub async fn post_response_url(&self, url: &str, body: &Value) -> Result<(), SlackError> {
        if !self.is_allowed_response_url(url) {
            warn!("refusing to post to response url {}", url);
            return Err(SlackError::ResponseUrlRefused(url.to_string()));
        }

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| SlackError::Transport {
                target: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Status {
                target: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn slack_api_post(&self, method: &str, form_body: String) -> Result<Value, SlackError> {
        let target = format!("{}/{method}", self.api_base_url);
        let response = self
            .http
            .post(&target)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form_body)
            .send()
            .await
            .map_err(|source| SlackError::Transport {
                target: target.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Status {
                target,
                status: status.as_u16(),
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|source| SlackError::Transport {
                target: target.clone(),
                source,
            })?;
        if !value.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let code = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            return Err(SlackError::Api {
                method: method.to_string(),
                code: code.to_string(),
            });
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(api_base_url: &str, response_url_pattern: &str) -> SlackConfig {
        SlackConfig {
            verification_token: "verification-token".to_string(),
            api_base_url: api_base_url.to_string(),
            request_timeout_secs: 5,
            response_url_pattern: response_url_pattern.to_string(),
            link_url_template: ":url_prefix/associate/:organization/:provider/".to_string(),
        }
    }

    #[tokio::test]
    async fn open_dialog_posts_form_with_bot_token() {
        let server = MockServer::start();
        let dialog_open = server.mock(|when, then| {
            when.method(POST)
                .path("/dialog.open")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_includes("token=xoxb-bot")
                .body_includes("trigger_id=13345224609.738474920")
                .body_includes("Resolve+Issue");
            then.status(200).json_body(json!({"ok": true}));
        });
        let client = SlackClient::new(&config(&server.base_url(), ".*")).unwrap();

        client
            .open_dialog(
                "xoxb-bot",
                "13345224609.738474920",
                &resolve_dialog("{\"issue\":1}"),
            )
            .await
            .unwrap();

        dialog_open.assert_calls(1);
    }

    #[tokio::test]
    async fn open_dialog_surfaces_api_error_code() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/dialog.open");
            then.status(200)
                .json_body(json!({"ok": false, "error": "expired_trigger_id"}));
        });
        let client = SlackClient::new(&config(&server.base_url(), ".*")).unwrap();

        let err = client
            .open_dialog("xoxb-bot", "trigger", &resolve_dialog("{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, SlackError::Api { ref code, .. } if code == "expired_trigger_id"));
    }

    #[tokio::test]
    async fn post_response_url_sends_json() {
        let server = MockServer::start();
        let hook = server.mock(|when, then| {
            when.method(POST)
                .path("/hooks/T1/B1")
                .json_body_includes(r#"{"text": "done"}"#);
            then.status(200).body("ok");
        });
        let client = SlackClient::new(&config(&server.base_url(), ".*")).unwrap();

        client
            .post_response_url(&server.url("/hooks/T1/B1"), &json!({"text": "done"}))
            .await
            .unwrap();

        hook.assert_calls(1);
    }

    #[tokio::test]
    async fn post_response_url_reports_failure_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/hooks/gone");
            then.status(404);
        });
        let client = SlackClient::new(&config(&server.base_url(), ".*")).unwrap();

        let err = client
            .post_response_url(&server.url("/hooks/gone"), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SlackError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn refused_response_url_is_never_contacted() {
        let server = MockServer::start();
        let hook = server.mock(|when, then| {
            when.method(POST);
            then.status(200);
        });
        let client = SlackClient::new(&config(
            "https://slack.com/api",
            r"^https://hooks\.slack\.com/",
        ))
        .unwrap();

        let err = client
            .post_response_url(&server.url("/hooks/T1/B1"), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SlackError::ResponseUrlRefused(_)));
        hook.assert_calls(0);
    }
}
