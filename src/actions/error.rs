use salvo::http::StatusCode;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::slack::SlackError;

pub const PERMISSION_DENIED_MESSAGE: &str =
    "Action failed: You do not have permission to perform this action.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Can't perform that action right now on your behalf!";

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("verification token mismatch")]
    Unauthorized,

    #[error("no slack integration for team {0}")]
    IntegrationNotFound(String),

    #[error("issue {0} is not reachable through this integration")]
    IssueNotFound(i64),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("user lacks permission on the issue's organization")]
    PermissionDenied,

    #[error("action rejected: {0}")]
    Rejected(String),

    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("slack call failed: {0}")]
    Slack(#[from] SlackError),

    #[error("failed to apply action: {0}")]
    MutationFailed(DatabaseError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ActionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ActionError::Unauthorized => StatusCode::UNAUTHORIZED,
            ActionError::IntegrationNotFound(_) | ActionError::IssueNotFound(_) => {
                StatusCode::FORBIDDEN
            }
            ActionError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            ActionError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }

    /// Storage failures once mutations have started are answered softly.
    pub fn during_mutation(self) -> Self {
        match self {
            ActionError::Database(err) => ActionError::MutationFailed(err),
            other => other,
        }
    }

    /// Text shown to the acting user for failures answered with a 200.
    pub fn ephemeral_text(&self) -> Option<String> {
        match self {
            ActionError::PermissionDenied => Some(PERMISSION_DENIED_MESSAGE.to_string()),
            ActionError::Rejected(reason) => Some(format!("Action failed: {reason}")),
            ActionError::UnsupportedAction(_)
            | ActionError::Slack(_)
            | ActionError::MutationFailed(_) => Some(GENERIC_FAILURE_MESSAGE.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ActionError::Unauthorized, StatusCode::UNAUTHORIZED ; "bad token")]
    #[test_case(ActionError::IntegrationNotFound("T1".into()), StatusCode::FORBIDDEN ; "no integration")]
    #[test_case(ActionError::IssueNotFound(1), StatusCode::FORBIDDEN ; "unreachable issue")]
    #[test_case(ActionError::MalformedPayload("x".into()), StatusCode::BAD_REQUEST ; "malformed")]
    #[test_case(ActionError::Database(DatabaseError::Query("x".into())), StatusCode::INTERNAL_SERVER_ERROR ; "storage")]
    #[test_case(ActionError::PermissionDenied, StatusCode::OK ; "denied")]
    fn status_codes(err: ActionError, expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
    }

    #[test]
    fn soft_failures_carry_user_text() {
        assert_eq!(
            ActionError::PermissionDenied.ephemeral_text().as_deref(),
            Some(PERMISSION_DENIED_MESSAGE)
        );
        assert_eq!(
            ActionError::Rejected("Cannot assign to non-members.".into())
                .ephemeral_text()
                .as_deref(),
            Some("Action failed: Cannot assign to non-members.")
        );
        assert_eq!(
            ActionError::MutationFailed(DatabaseError::NotFound("issue".into()))
                .ephemeral_text()
                .as_deref(),
            Some(GENERIC_FAILURE_MESSAGE)
        );
        assert!(ActionError::Unauthorized.ephemeral_text().is_none());
    }
}
