use serde::Serialize;

use crate::db::{IssueStatus, Resolution};

pub const RESOLVE_TYPE_FIELD: &str = "resolve_type";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogElement {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub value: String,
    pub options: Vec<SelectOption>,
}

/// Dialog descriptor as accepted by `dialog.open`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialog {
    pub callback_id: String,
    pub title: String,
    pub submit_label: String,
    pub elements: Vec<DialogElement>,
}

/// The select menu offered when resolving an issue from chat.
pub fn resolve_selector() -> DialogElement {
    DialogElement {
        label: "Resolve issue".to_string(),
        kind: "select".to_string(),
        name: RESOLVE_TYPE_FIELD.to_string(),
        value: IssueStatus::Resolved.as_str().to_string(),
        options: vec![
            SelectOption::new("Immediately", IssueStatus::Resolved.as_str()),
            SelectOption::new(
                "In the next release",
                format!("resolved:{}", Resolution::InNextRelease.as_str()),
            ),
            SelectOption::new(
                "In the current release",
                format!("resolved:{}", Resolution::InCurrentRelease.as_str()),
            ),
        ],
    }
}

pub fn resolve_dialog(callback_id: impl Into<String>) -> Dialog {
    Dialog {
        callback_id: callback_id.into(),
        title: "Resolve Issue".to_string(),
        submit_label: "Resolve".to_string(),
        elements: vec![resolve_selector()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_dialog_serializes_select_menu() {
        let dialog = resolve_dialog("{\"issue\":1}");
        let value = serde_json::to_value(&dialog).unwrap();
        assert_eq!(value["title"], "Resolve Issue");
        assert_eq!(value["submit_label"], "Resolve");
        assert_eq!(value["callback_id"], "{\"issue\":1}");
        assert_eq!(value["elements"][0]["type"], "select");
        assert_eq!(value["elements"][0]["name"], RESOLVE_TYPE_FIELD);
        assert_eq!(
            value["elements"][0]["options"],
            json!([
                {"label": "Immediately", "value": "resolved"},
                {"label": "In the next release", "value": "resolved:inNextRelease"},
                {"label": "In the current release", "value": "resolved:inCurrentRelease"},
            ])
        );
    }
}
