use super::ActionError;
use super::payload::{ActionPayload, PayloadKind};
use crate::db::{IssueStatus, Resolution};
use crate::slack::RESOLVE_TYPE_FIELD;

const UNASSIGN_VALUE: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: IssueStatus,
    pub resolution: Option<Resolution>,
}

impl StatusChange {
    /// Parses `ignored`, `unresolved`, `resolved` or `resolved:<detail>`.
    pub fn parse(value: &str) -> Option<Self> {
        let (status, detail) = match value.split_once(':') {
            Some((status, detail)) => (status, Some(detail)),
            None => (value, None),
        };
        let status = IssueStatus::parse(status)?;
        let resolution = match (status, detail) {
            (_, None) => None,
            (IssueStatus::Resolved, Some(detail)) => Some(Resolution::parse(detail)?),
            _ => return None,
        };
        Some(Self { status, resolution })
    }

    pub fn verb(&self) -> &'static str {
        match self.status {
            IssueStatus::Ignored => "ignored",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Unresolved => "re-opened",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutedAction {
    Status(StatusChange),
    Assign { username: String },
    Unassign,
    OpenResolveDialog,
}

/// Routes every action of a payload up front; one unroutable action
/// rejects the whole payload before anything is mutated. Opening the
/// resolve dialog must be the only action of its payload.
pub fn plan(payload: &ActionPayload) -> Result<Vec<RoutedAction>, ActionError> {
    match payload.kind() {
        PayloadKind::DialogSubmission => {
            let value = payload.submission_value(RESOLVE_TYPE_FIELD).ok_or_else(|| {
                ActionError::UnsupportedAction("dialog submission without resolve_type".to_string())
            })?;
            let change = StatusChange::parse(value).ok_or_else(|| {
                ActionError::UnsupportedAction(format!("unknown resolve_type {value}"))
            })?;
            Ok(vec![RoutedAction::Status(change)])
        }
        PayloadKind::InteractiveMessage => {
            if payload.actions.is_empty() {
                return Err(ActionError::UnsupportedAction(
                    "payload carries no actions".to_string(),
                ));
            }
            let plan = payload
                .actions
                .iter()
                .map(|action| {
                    let value = action.selected_value();
                    match (action.name.as_str(), value) {
                        ("status", Some(value)) => StatusChange::parse(value)
                            .map(RoutedAction::Status)
                            .ok_or_else(|| {
                                ActionError::UnsupportedAction(format!("unknown status {value}"))
                            }),
                        ("assign", Some(UNASSIGN_VALUE)) => Ok(RoutedAction::Unassign),
                        ("assign", Some(username)) if !username.is_empty() => {
                            Ok(RoutedAction::Assign {
                                username: username.to_string(),
                            })
                        }
                        ("resolve_dialog", _) => Ok(RoutedAction::OpenResolveDialog),
                        (name, _) => Err(ActionError::UnsupportedAction(format!(
                            "unroutable action {name}"
                        ))),
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            if plan.len() > 1 && plan.contains(&RoutedAction::OpenResolveDialog) {
                return Err(ActionError::UnsupportedAction(
                    "resolve_dialog combined with other actions".to_string(),
                ));
            }
            Ok(plan)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use test_case::test_case;

    fn payload(kind: &str, actions: Value, submission: Option<Value>) -> ActionPayload {
        let mut raw = json!({
            "team": {"id": "TXXXXXXX1"},
            "user": {"id": "slack_id"},
            "type": kind,
            "actions": actions,
        });
        if let Some(submission) = submission {
            raw["submission"] = submission;
        }
        ActionPayload::parse(&raw.to_string()).unwrap()
    }

    #[test_case("ignored", IssueStatus::Ignored, None ; "ignored")]
    #[test_case("unresolved", IssueStatus::Unresolved, None ; "unresolved")]
    #[test_case("resolved", IssueStatus::Resolved, None ; "resolved")]
    #[test_case("resolved:inNextRelease", IssueStatus::Resolved, Some(Resolution::InNextRelease) ; "next release")]
    #[test_case("resolved:inCurrentRelease", IssueStatus::Resolved, Some(Resolution::InCurrentRelease) ; "current release")]
    fn status_values_parse(value: &str, status: IssueStatus, resolution: Option<Resolution>) {
        assert_eq!(
            StatusChange::parse(value),
            Some(StatusChange { status, resolution })
        );
    }

    #[test_case("muted" ; "unknown status")]
    #[test_case("resolved:someday" ; "unknown detail")]
    #[test_case("ignored:inNextRelease" ; "detail on ignored")]
    #[test_case("" ; "empty")]
    fn bad_status_values_are_rejected(value: &str) {
        assert_eq!(StatusChange::parse(value), None);
    }

    #[test]
    fn verbs_match_confirmation_text() {
        assert_eq!(StatusChange::parse("ignored").unwrap().verb(), "ignored");
        assert_eq!(StatusChange::parse("resolved").unwrap().verb(), "resolved");
        assert_eq!(StatusChange::parse("unresolved").unwrap().verb(), "re-opened");
    }

    #[test]
    fn interactive_actions_are_routed_in_order() {
        let payload = payload(
            "event_callback",
            json!([
                {"name": "status", "value": "ignored", "type": "button"},
                {"name": "assign", "selected_options": [{"value": "jane"}]},
                {"name": "assign", "selected_options": [{"value": "none"}]},
            ]),
            None,
        );
        assert_eq!(
            plan(&payload).unwrap(),
            vec![
                RoutedAction::Status(StatusChange {
                    status: IssueStatus::Ignored,
                    resolution: None
                }),
                RoutedAction::Assign {
                    username: "jane".to_string()
                },
                RoutedAction::Unassign,
            ]
        );
    }

    #[test]
    fn resolve_dialog_routes_alone() {
        let payload = payload(
            "interactive_message",
            json!([{"name": "resolve_dialog", "value": "resolve_dialog"}]),
            None,
        );
        assert_eq!(plan(&payload).unwrap(), vec![RoutedAction::OpenResolveDialog]);
    }

    #[test_case(json!([{"name": "status", "value": "ignored"}, {"name": "resolve_dialog"}]) ; "after status")]
    #[test_case(json!([{"name": "resolve_dialog"}, {"name": "assign", "selected_options": [{"value": "none"}]}]) ; "before unassign")]
    fn resolve_dialog_mixed_with_mutations_is_unsupported(actions: Value) {
        let payload = payload("interactive_message", actions, None);
        assert!(matches!(
            plan(&payload),
            Err(ActionError::UnsupportedAction(_))
        ));
    }

    #[test]
    fn one_unknown_action_rejects_the_plan() {
        let payload = payload(
            "interactive_message",
            json!([
                {"name": "status", "value": "ignored"},
                {"name": "archive", "value": "forever"},
            ]),
            None,
        );
        assert!(matches!(
            plan(&payload),
            Err(ActionError::UnsupportedAction(_))
        ));
    }

    #[test]
    fn empty_action_list_is_unsupported() {
        let payload = payload("interactive_message", json!([]), None);
        assert!(matches!(
            plan(&payload),
            Err(ActionError::UnsupportedAction(_))
        ));
    }

    #[test]
    fn dialog_submission_routes_resolve_type() {
        let payload = payload(
            "dialog_submission",
            json!([]),
            Some(json!({"resolve_type": "resolved:inCurrentRelease"})),
        );
        assert_eq!(
            plan(&payload).unwrap(),
            vec![RoutedAction::Status(StatusChange {
                status: IssueStatus::Resolved,
                resolution: Some(Resolution::InCurrentRelease),
            })]
        );

        let missing = payload_without_submission();
        assert!(matches!(
            plan(&missing),
            Err(ActionError::UnsupportedAction(_))
        ));
    }

    fn payload_without_submission() -> ActionPayload {
        payload("dialog_submission", json!([]), Some(json!({})))
    }
}
