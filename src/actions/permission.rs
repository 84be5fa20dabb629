use std::sync::Arc;

use tracing::debug;

use super::ActionError;
use crate::config::{PermissionConfig, SsoRequirement};
use crate::db::models::{AuthIdentity, AuthProvider, OrganizationMember};
use crate::db::{DatabaseError, OrganizationStore, User};

/// Everything the policy looks at, loaded ahead of time.
#[derive(Debug, Clone, Copy)]
pub struct PermissionFacts<'a> {
    pub user: &'a User,
    pub membership: Option<&'a OrganizationMember>,
    pub auth_provider: Option<&'a AuthProvider>,
    pub auth_identity: Option<&'a AuthIdentity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    InactiveUser,
    NotMember,
    MissingSsoIdentity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied(DenialReason),
}

pub fn evaluate(policy: &PermissionConfig, facts: &PermissionFacts<'_>) -> Verdict {
    if !facts.user.is_active {
        return Verdict::Denied(DenialReason::InactiveUser);
    }
    if facts.user.is_superuser && policy.allow_superuser {
        return Verdict::Allowed;
    }
    if facts.membership.is_none() {
        return Verdict::Denied(DenialReason::NotMember);
    }
    if facts.auth_provider.is_some()
        && policy.sso == SsoRequirement::LinkedIdentity
        && facts.auth_identity.is_none()
    {
        return Verdict::Denied(DenialReason::MissingSsoIdentity);
    }
    Verdict::Allowed
}

pub struct PermissionChecker {
    organizations: Arc<dyn OrganizationStore>,
    policy: PermissionConfig,
}

impl PermissionChecker {
    pub fn new(organizations: Arc<dyn OrganizationStore>, policy: PermissionConfig) -> Self {
        Self {
            organizations,
            policy,
        }
    }

    pub async fn check(&self, organization_id: i64, user: &User) -> Result<Verdict, DatabaseError> {
        let membership = self.organizations.get_member(organization_id, user.id).await?;
        let auth_provider = self.organizations.get_auth_provider(organization_id).await?;
        let auth_identity = match auth_provider {
            Some(ref provider) => {
                self.organizations
                    .get_auth_identity(provider.id, user.id)
                    .await?
            }
            None => None,
        };

        let verdict = evaluate(
            &self.policy,
            &PermissionFacts {
                user,
                membership: membership.as_ref(),
                auth_provider: auth_provider.as_ref(),
                auth_identity: auth_identity.as_ref(),
            },
        );
        debug!(
            "permission verdict for user {} on organization {}: {:?}",
            user.id, organization_id, verdict
        );
        Ok(verdict)
    }

    pub async fn ensure_allowed(&self, organization_id: i64, user: &User) -> Result<(), ActionError> {
        match self.check(organization_id, user).await? {
            Verdict::Allowed => Ok(()),
            Verdict::Denied(_) => Err(ActionError::PermissionDenied),
        }
    }

    /// Assignees must be active members of the organization.
    pub async fn is_active_member(
        &self,
        organization_id: i64,
        user: &User,
    ) -> Result<bool, DatabaseError> {
        if !user.is_active {
            return Ok(false);
        }
        Ok(self
            .organizations
            .get_member(organization_id, user.id)
            .await?
            .is_some())
    }
}
