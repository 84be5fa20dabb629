use serde::{Deserialize, Deserializer, Serialize};

use super::ActionError;

/// Correlation data carried through Slack in a `callback_id`.
///
/// The resolve dialog is submitted as a separate request, so everything
/// needed to finish the action travels inside this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackData {
    #[serde(deserialize_with = "deserialize_issue_id")]
    pub issue: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_response_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_message: Option<bool>,
}

impl CallbackData {
    pub fn for_issue(issue: i64) -> Self {
        Self {
            issue,
            orig_response_url: None,
            is_message: None,
        }
    }

    pub fn for_dialog(issue: i64, orig_response_url: Option<String>, is_message: bool) -> Self {
        Self {
            issue,
            orig_response_url,
            is_message: Some(is_message),
        }
    }

    pub fn decode(raw: &str) -> Result<Self, ActionError> {
        serde_json::from_str(raw)
            .map_err(|e| ActionError::MalformedPayload(format!("invalid callback_id: {e}")))
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"issue\":{}}}", self.issue))
    }
}

fn deserialize_issue_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IssueId {
        Number(i64),
        Text(String),
    }

    match IssueId::deserialize(deserializer)? {
        IssueId::Number(id) => Ok(id),
        IssueId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("issue id {text:?} is not numeric"))),
    }
}
