use std::sync::Arc;

use tracing::{debug, warn};

use super::ActionError;
use crate::db::models::{IdentityProvider, SLACK_PROVIDER};
use crate::db::{
    Identity, IdentityStatus, IdentityStore, Integration, IntegrationStore, Organization,
    OrganizationStore, User,
};
use crate::utils::formatting::apply_pattern_string;

pub const LINK_IDENTITY_MESSAGE: &str = "Looks like you haven't linked your account with your Slack identity yet! <{associate_url}|Link your identity now> to perform actions through Slack.";

pub fn link_identity_message(associate_url: &str) -> String {
    LINK_IDENTITY_MESSAGE.replace("{associate_url}", associate_url)
}

#[derive(Debug, Clone)]
pub enum IdentityResolution {
    Linked {
        provider: IdentityProvider,
        identity: Identity,
        user: User,
    },
    NeedsLinking {
        associate_url: String,
    },
}

pub struct IdentityResolver {
    integrations: Arc<dyn IntegrationStore>,
    identities: Arc<dyn IdentityStore>,
    organizations: Arc<dyn OrganizationStore>,
    link_url_template: String,
    url_prefix: String,
}

impl IdentityResolver {
    pub fn new(
        integrations: Arc<dyn IntegrationStore>,
        identities: Arc<dyn IdentityStore>,
        organizations: Arc<dyn OrganizationStore>,
        link_url_template: impl Into<String>,
        url_prefix: impl Into<String>,
    ) -> Self {
        Self {
            integrations,
            identities,
            organizations,
            link_url_template: link_url_template.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub async fn integration_for_team(&self, team_id: &str) -> Result<Integration, ActionError> {
        match self
            .integrations
            .get_integration_by_external_id(SLACK_PROVIDER, team_id)
            .await?
        {
            Some(integration) => Ok(integration),
            None => {
                warn!("no slack integration bound to team {}", team_id);
                Err(ActionError::IntegrationNotFound(team_id.to_string()))
            }
        }
    }

    pub async fn organization_ids(&self, integration: &Integration) -> Result<Vec<i64>, ActionError> {
        Ok(self.integrations.get_organization_ids(integration.id).await?)
    }

    pub fn associate_url(&self, organization: &Organization) -> String {
        apply_pattern_string(
            &self.link_url_template,
            &[
                ("url_prefix", &self.url_prefix),
                ("organization", &organization.slug),
                ("provider", SLACK_PROVIDER),
            ],
        )
    }

    pub async fn resolve(
        &self,
        organization: &Organization,
        external_user_id: &str,
    ) -> Result<IdentityResolution, ActionError> {
        let needs_linking = || IdentityResolution::NeedsLinking {
            associate_url: self.associate_url(organization),
        };

        let Some(provider) = self
            .identities
            .get_identity_provider(SLACK_PROVIDER, organization.id)
            .await?
        else {
            debug!("organization {} has no slack identity provider", organization.slug);
            return Ok(needs_linking());
        };

        let Some(identity) = self
            .identities
            .get_identity_by_external_id(provider.id, external_user_id)
            .await?
        else {
            debug!("no identity for {} in {}", external_user_id, organization.slug);
            return Ok(needs_linking());
        };

        if identity.status() != IdentityStatus::Valid {
            debug!("identity {} is {:?}", identity.id, identity.status());
            return Ok(needs_linking());
        }

        let Some(user_id) = identity.user_id else {
            return Ok(needs_linking());
        };
        let user = match self.organizations.get_user(user_id).await? {
            Some(user) if user.is_active => user,
            _ => return Ok(needs_linking()),
        };

        Ok(IdentityResolution::Linked {
            provider,
            identity,
            user,
        })
    }

    /// External id of a valid identity the user holds on `provider`, if any.
    pub async fn external_id_for_user(
        &self,
        provider: &IdentityProvider,
        user: &User,
    ) -> Result<Option<String>, ActionError> {
        Ok(self
            .identities
            .get_identity_for_user(provider.id, user.id)
            .await?
            .filter(|identity| identity.status() == IdentityStatus::Valid)
            .map(|identity| identity.external_id))
    }
}
