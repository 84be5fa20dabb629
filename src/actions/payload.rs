use serde::Deserialize;
use serde_json::{Map, Value};

use super::ActionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    InteractiveMessage,
    DialogSubmission,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Team {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatUser {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackAction {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

impl SlackAction {
    /// Value picked from a select menu, or the button value.
    pub fn selected_value(&self) -> Option<&str> {
        self.selected_options
            .first()
            .map(|option| option.value.as_str())
            .or(self.value.as_deref())
    }
}

/// One interactive callback as posted by Slack in the `payload` form field.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionPayload {
    #[serde(default)]
    pub token: String,
    pub team: Team,
    pub user: ChatUser,
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub actions: Vec<SlackAction>,
    #[serde(default)]
    pub original_message: Option<Value>,
    #[serde(default)]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub submission: Option<Map<String, Value>>,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl ActionPayload {
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        serde_json::from_str(raw)
            .map_err(|e| ActionError::MalformedPayload(format!("invalid payload json: {e}")))
    }

    pub fn kind(&self) -> PayloadKind {
        match self.kind.as_str() {
            "dialog_submission" => PayloadKind::DialogSubmission,
            _ => PayloadKind::InteractiveMessage,
        }
    }

    /// Whether the interaction came from a message the bot posted, as
    /// opposed to an unfurled link.
    pub fn is_message(&self) -> bool {
        self.original_message
            .as_ref()
            .and_then(|message| message.get("type"))
            .and_then(Value::as_str)
            == Some("message")
    }

    pub fn submission_value(&self, field: &str) -> Option<&str> {
        self.submission
            .as_ref()
            .and_then(|submission| submission.get(field))
            .and_then(Value::as_str)
    }
}
