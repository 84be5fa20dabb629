use serde_json::{Value, json};

use super::callback::CallbackData;
use super::router::StatusChange;
use crate::db::{Issue, Organization, Project};
use crate::slack::{ACTIONED_ISSUE_COLOR, Attachment};
use crate::utils::formatting::{qualified_short_id, slack_mention};

/// What the endpoint answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionReply {
    /// Text only the acting user sees; the original message stays.
    Ephemeral(String),
    /// Replacement for the original message.
    Message(Value),
    /// Empty 200 body.
    Empty,
}

impl ActionReply {
    pub fn to_json(&self) -> Option<Value> {
        match self {
            ActionReply::Ephemeral(text) => Some(json!({
                "response_type": "ephemeral",
                "replace_original": false,
                "text": text,
            })),
            ActionReply::Message(body) => Some(body.clone()),
            ActionReply::Empty => None,
        }
    }
}

/// Issue with the rows needed to render it.
#[derive(Debug, Clone)]
pub struct IssueContext {
    pub issue: Issue,
    pub project: Project,
    pub organization: Organization,
}

impl IssueContext {
    pub fn issue_url(&self, url_prefix: &str) -> String {
        format!(
            "{}/organizations/{}/issues/{}/?referrer=slack",
            url_prefix.trim_end_matches('/'),
            self.organization.slug,
            self.issue.id
        )
    }
}

pub fn status_text(change: &StatusChange, actor_external_id: &str) -> String {
    format!(
        "*Issue {} by {}*",
        change.verb(),
        slack_mention(actor_external_id)
    )
}

pub fn assign_text(assignee_label: &str, actor_external_id: &str) -> String {
    format!(
        "*Issue assigned to {} by {}*",
        assignee_label,
        slack_mention(actor_external_id)
    )
}

pub fn unassign_text(actor_external_id: &str) -> String {
    format!("*Issue unassigned by {}*", slack_mention(actor_external_id))
}

pub fn build_attachment(context: &IssueContext, url_prefix: &str, action_lines: &[String]) -> Value {
    let issue = &context.issue;
    let mut text_lines = Vec::with_capacity(action_lines.len() + 1);
    if !issue.culprit.is_empty() {
        text_lines.push(issue.culprit.clone());
    }
    text_lines.extend(action_lines.iter().cloned());

    Attachment::new()
        .fallback(format!("[{}] {}", context.project.slug, issue.title))
        .title(issue.title.clone(), context.issue_url(url_prefix))
        .text(text_lines.join("\n"))
        .markdown_in("text")
        .callback_id(CallbackData::for_issue(issue.id).encode())
        .footer(qualified_short_id(&context.project.slug, issue.short_id))
        .ts(issue.last_seen)
        .color(ACTIONED_ISSUE_COLOR)
        .to_json()
}

/// Bot messages are replaced by a message carrying the attachment;
/// unfurls take the attachment itself.
pub fn construct_reply(attachment: Value, is_message: bool) -> Value {
    if is_message {
        json!({ "attachments": [attachment] })
    } else {
        attachment
    }
}
