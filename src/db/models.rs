use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::schema::{
    auth_identities, auth_providers, identities, identity_providers, integrations, issues,
    organization_integrations, organization_members, organizations, projects, users,
};

pub const SLACK_PROVIDER: &str = "slack";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Unresolved,
    Resolved,
    Ignored,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Unresolved => "unresolved",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Ignored => "ignored",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unresolved" => Some(IssueStatus::Unresolved),
            "resolved" => Some(IssueStatus::Resolved),
            "ignored" => Some(IssueStatus::Ignored),
            _ => None,
        }
    }
}

/// Extra detail recorded alongside a `resolved` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "inNextRelease")]
    InNextRelease,
    #[serde(rename = "inCurrentRelease")]
    InCurrentRelease,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::InNextRelease => "inNextRelease",
            Resolution::InCurrentRelease => "inCurrentRelease",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "inNextRelease" => Some(Resolution::InNextRelease),
            "inCurrentRelease" => Some(Resolution::InCurrentRelease),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
    Unknown,
    Valid,
    Invalid,
}

impl IdentityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityStatus::Unknown => "unknown",
            IdentityStatus::Valid => "valid",
            IdentityStatus::Invalid => "invalid",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "valid" => IdentityStatus::Valid,
            "invalid" => IdentityStatus::Invalid,
            _ => IdentityStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = organizations)]
pub struct Organization {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl User {
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            &self.name
        } else if !self.email.trim().is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = organization_members)]
pub struct OrganizationMember {
    pub id: i64,
    pub organization_id: i64,
    pub user_id: i64,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = integrations)]
pub struct Integration {
    pub id: i64,
    pub provider: String,
    pub external_id: String,
    pub name: String,
    pub access_token: String,
    pub bot_access_token: Option<String>,
}

impl Integration {
    /// Token used for bot-initiated calls; falls back to the user token.
    pub fn bot_token(&self) -> &str {
        self.bot_access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .unwrap_or(&self.access_token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = identity_providers)]
pub struct IdentityProvider {
    pub id: i64,
    pub provider_type: String,
    pub organization_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = identities)]
pub struct Identity {
    pub id: i64,
    pub idp_id: i64,
    pub user_id: Option<i64>,
    pub external_id: String,
    pub status: String,
}

impl Identity {
    pub fn status(&self) -> IdentityStatus {
        IdentityStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = auth_providers)]
pub struct AuthProvider {
    pub id: i64,
    pub organization_id: i64,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = auth_identities)]
pub struct AuthIdentity {
    pub id: i64,
    pub auth_provider_id: i64,
    pub user_id: i64,
    pub ident: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = projects)]
pub struct Project {
    pub id: i64,
    pub organization_id: i64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = issues)]
pub struct Issue {
    pub id: i64,
    pub project_id: i64,
    pub short_id: i64,
    pub title: String,
    pub culprit: String,
    pub status: String,
    pub resolution: Option<String>,
    pub assignee_id: Option<i64>,
    pub last_seen: i64,
}

impl Issue {
    pub fn status(&self) -> IssueStatus {
        IssueStatus::parse(&self.status).unwrap_or(IssueStatus::Unresolved)
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution.as_deref().and_then(Resolution::parse)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = organizations)]
pub struct NewOrganization {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn active(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            email: format!("{username}@example.com"),
            name: String::new(),
            username,
            is_active: true,
            is_superuser: false,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = organization_members)]
pub struct NewOrganizationMember {
    pub organization_id: i64,
    pub user_id: i64,
    pub role: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = integrations)]
pub struct NewIntegration {
    pub provider: String,
    pub external_id: String,
    pub name: String,
    pub access_token: String,
    pub bot_access_token: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = organization_integrations)]
pub struct NewOrganizationIntegration {
    pub organization_id: i64,
    pub integration_id: i64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = identity_providers)]
pub struct NewIdentityProvider {
    pub provider_type: String,
    pub organization_id: i64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = identities)]
pub struct NewIdentity {
    pub idp_id: i64,
    pub user_id: Option<i64>,
    pub external_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = auth_providers)]
pub struct NewAuthProvider {
    pub organization_id: i64,
    pub provider: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = auth_identities)]
pub struct NewAuthIdentity {
    pub auth_provider_id: i64,
    pub user_id: i64,
    pub ident: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject {
    pub organization_id: i64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = issues)]
pub struct NewIssue {
    pub project_id: i64,
    pub short_id: i64,
    pub title: String,
    pub culprit: String,
    pub status: String,
    pub resolution: Option<String>,
    pub assignee_id: Option<i64>,
    pub last_seen: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn user(name: &str, email: &str) -> User {
        User {
            id: 1,
            username: "jdoe".to_string(),
            name: name.to_string(),
            email: email.to_string(),
            is_active: true,
            is_superuser: false,
        }
    }

    #[test_case("Jane Doe", "jane@example.com", "Jane Doe" ; "prefers name")]
    #[test_case("", "jane@example.com", "jane@example.com" ; "falls back to email")]
    #[test_case(" ", "", "jdoe" ; "falls back to username")]
    fn display_name_fallbacks(name: &str, email: &str, expected: &str) {
        assert_eq!(user(name, email).display_name(), expected);
    }

    #[test]
    fn bot_token_falls_back_to_access_token() {
        let mut integration = Integration {
            id: 1,
            provider: SLACK_PROVIDER.to_string(),
            external_id: "TXXXXXXX1".to_string(),
            name: "Example".to_string(),
            access_token: "xoxp-user".to_string(),
            bot_access_token: Some("xoxb-bot".to_string()),
        };
        assert_eq!(integration.bot_token(), "xoxb-bot");
        integration.bot_access_token = Some(String::new());
        assert_eq!(integration.bot_token(), "xoxp-user");
        integration.bot_access_token = None;
        assert_eq!(integration.bot_token(), "xoxp-user");
    }

    #[test]
    fn unknown_issue_status_reads_as_unresolved() {
        let issue = Issue {
            id: 1,
            project_id: 1,
            short_id: 1,
            title: "boom".to_string(),
            culprit: String::new(),
            status: "muted".to_string(),
            resolution: Some("inNextRelease".to_string()),
            assignee_id: None,
            last_seen: 0,
        };
        assert_eq!(issue.status(), IssueStatus::Unresolved);
        assert_eq!(issue.resolution(), Some(Resolution::InNextRelease));
    }
}
