use serde_json::{Map, Value};

/// Grey used once somebody has acted on an issue notification.
pub const ACTIONED_ISSUE_COLOR: &str = "#EDEEEF";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    pub fallback: Option<String>,
    pub title: Option<String>,
    pub title_link: Option<String>,
    pub text: Option<String>,
    pub mrkdwn_in: Vec<String>,
    pub callback_id: Option<String>,
    pub footer: Option<String>,
    pub ts: Option<i64>,
    pub color: Option<String>,
}

impl Attachment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>, link: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self.title_link = Some(link.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn markdown_in(mut self, field: impl Into<String>) -> Self {
        self.mrkdwn_in.push(field.into());
        self
    }

    pub fn callback_id(mut self, callback_id: impl Into<String>) -> Self {
        self.callback_id = Some(callback_id.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn ts(mut self, ts: i64) -> Self {
        self.ts = Some(ts);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn to_json(&self) -> Value {
        let mut attachment = Map::new();

        let strings = [
            ("fallback", &self.fallback),
            ("title", &self.title),
            ("title_link", &self.title_link),
            ("text", &self.text),
            ("callback_id", &self.callback_id),
            ("footer", &self.footer),
            ("color", &self.color),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                attachment.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        if !self.mrkdwn_in.is_empty() {
            attachment.insert(
                "mrkdwn_in".to_string(),
                Value::Array(self.mrkdwn_in.iter().cloned().map(Value::String).collect()),
            );
        }

        if let Some(ts) = self.ts {
            attachment.insert("ts".to_string(), Value::Number(ts.into()));
        }

        // Buttons are dropped once acted upon.
        attachment.insert("actions".to_string(), Value::Array(Vec::new()));

        Value::Object(attachment)
    }
}
