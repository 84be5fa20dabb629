use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::callback::CallbackData;
use super::identity::{IdentityResolution, IdentityResolver, link_identity_message};
use super::payload::{ActionPayload, PayloadKind};
use super::permission::PermissionChecker;
use super::reply::{
    ActionReply, IssueContext, assign_text, build_attachment, construct_reply, status_text,
    unassign_text,
};
use super::router::{self, RoutedAction};
use super::token::TokenValidator;
use super::ActionError;
use crate::config::Config;
use crate::db::models::IdentityProvider;
use crate::db::{DatabaseManager, Integration, IssueStore, OrganizationStore, User};
use crate::slack::{SlackClient, resolve_dialog};
use crate::utils::formatting::slack_mention;
use crate::web::metrics::Metrics;

/// The acting user once identity and permission checks passed.
struct Actor {
    external_id: String,
    user: User,
    provider: IdentityProvider,
}

pub struct ActionService {
    tokens: TokenValidator,
    resolver: IdentityResolver,
    permissions: PermissionChecker,
    issues: Arc<dyn IssueStore>,
    organizations: Arc<dyn OrganizationStore>,
    slack: SlackClient,
    url_prefix: String,
}

impl ActionService {
    pub fn new(config: &Config, db: &DatabaseManager, slack: SlackClient) -> Self {
        let organizations = db.organization_store();
        Self {
            tokens: TokenValidator::new(&config.slack.verification_token),
            resolver: IdentityResolver::new(
                db.integration_store(),
                db.identity_store(),
                organizations.clone(),
                config.slack.link_url_template.clone(),
                config.server.url_prefix.clone(),
            ),
            permissions: PermissionChecker::new(organizations.clone(), config.permissions.clone()),
            issues: db.issue_store(),
            organizations,
            slack,
            url_prefix: config.server.url_prefix.clone(),
        }
    }

    /// Runs one payload end to end. Failures the user should see come back
    /// as ephemeral replies; the rest map to HTTP errors.
    pub async fn handle(&self, payload: &ActionPayload) -> Result<ActionReply, ActionError> {
        match self.process(payload).await {
            Ok(reply) => Ok(reply),
            Err(err) => match err.ephemeral_text() {
                Some(text) => {
                    if matches!(err, ActionError::PermissionDenied) {
                        Metrics::action_denied();
                        info!("denied action from {}", payload.user.id);
                    } else {
                        Metrics::soft_failure();
                        warn!("action from {} failed: {}", payload.user.id, err);
                    }
                    Ok(ActionReply::Ephemeral(text))
                }
                None => Err(err),
            },
        }
    }

    async fn process(&self, payload: &ActionPayload) -> Result<ActionReply, ActionError> {
        self.tokens.validate(&payload.token)?;

        let integration = self.resolver.integration_for_team(&payload.team.id).await?;
        let callback = CallbackData::decode(&payload.callback_id)?;
        let mut context = self.load_issue(callback.issue, &integration).await?;

        let actor = match self
            .resolver
            .resolve(&context.organization, &payload.user.id)
            .await?
        {
            IdentityResolution::Linked {
                provider,
                identity,
                user,
            } => Actor {
                external_id: identity.external_id,
                user,
                provider,
            },
            IdentityResolution::NeedsLinking { associate_url } => {
                Metrics::link_prompted();
                debug!("asking {} to link their identity", payload.user.id);
                return Ok(ActionReply::Ephemeral(link_identity_message(&associate_url)));
            }
        };

        self.permissions
            .ensure_allowed(context.organization.id, &actor.user)
            .await?;

        let plan = router::plan(payload)?;

        match payload.kind() {
            PayloadKind::DialogSubmission => {
                self.submit_dialog(payload, &callback, &mut context, &actor, &plan)
                    .await
            }
            PayloadKind::InteractiveMessage => {
                self.dispatch(payload, &integration, &mut context, &actor, &plan)
                    .await
            }
        }
    }

    async fn load_issue(
        &self,
        issue_id: i64,
        integration: &Integration,
    ) -> Result<IssueContext, ActionError> {
        let organization_ids = self.resolver.organization_ids(integration).await?;
        let issue = self
            .issues
            .get_issue(issue_id)
            .await?
            .ok_or(ActionError::IssueNotFound(issue_id))?;
        let project = self
            .issues
            .get_project(issue.project_id)
            .await?
            .ok_or(ActionError::IssueNotFound(issue_id))?;
        if !organization_ids.contains(&project.organization_id) {
            warn!(
                "issue {} belongs to organization {} which integration {} does not serve",
                issue_id, project.organization_id, integration.id
            );
            return Err(ActionError::IssueNotFound(issue_id));
        }
        let organization = self
            .organizations
            .get_organization(project.organization_id)
            .await?
            .ok_or(ActionError::IssueNotFound(issue_id))?;

        Ok(IssueContext {
            issue,
            project,
            organization,
        })
    }

    async fn dispatch(
        &self,
        payload: &ActionPayload,
        integration: &Integration,
        context: &mut IssueContext,
        actor: &Actor,
        plan: &[RoutedAction],
    ) -> Result<ActionReply, ActionError> {
        if let [RoutedAction::OpenResolveDialog] = plan {
            self.open_resolve_dialog(payload, integration, context).await?;
            return Ok(ActionReply::Empty);
        }

        let attachment = self.apply_plan(plan, context, actor).await?;
        Ok(ActionReply::Message(construct_reply(
            attachment,
            payload.is_message(),
        )))
    }

    async fn submit_dialog(
        &self,
        payload: &ActionPayload,
        callback: &CallbackData,
        context: &mut IssueContext,
        actor: &Actor,
        plan: &[RoutedAction],
    ) -> Result<ActionReply, ActionError> {
        let attachment = self.apply_plan(plan, context, actor).await?;
        let body = construct_reply(attachment, callback.is_message.unwrap_or(false));

        let response_url = callback
            .orig_response_url
            .as_deref()
            .or(payload.response_url.as_deref());
        match response_url {
            Some(url) => {
                if let Err(e) = self.slack.post_response_url(url, &body).await {
                    Metrics::response_url_failed();
                    error!("failed to update message for issue {}: {}", context.issue.id, e);
                }
            }
            None => warn!(
                "dialog submission for issue {} carries no response url",
                context.issue.id
            ),
        }

        Ok(ActionReply::Empty)
    }

    /// Applies every routed action in order, then renders the refreshed issue
    /// with one confirmation line per action.
    async fn apply_plan(
        &self,
        plan: &[RoutedAction],
        context: &mut IssueContext,
        actor: &Actor,
    ) -> Result<Value, ActionError> {
        let mut lines = Vec::with_capacity(plan.len());
        for action in plan {
            lines.push(
                self.apply(action, context, actor)
                    .await
                    .map_err(ActionError::during_mutation)?,
            );
        }
        self.refresh_issue(context)
            .await
            .map_err(ActionError::during_mutation)?;
        Ok(build_attachment(context, &self.url_prefix, &lines))
    }

    async fn open_resolve_dialog(
        &self,
        payload: &ActionPayload,
        integration: &Integration,
        context: &IssueContext,
    ) -> Result<(), ActionError> {
        let trigger_id = payload.trigger_id.as_deref().ok_or_else(|| {
            ActionError::UnsupportedAction("resolve_dialog without trigger_id".to_string())
        })?;
        let callback = CallbackData::for_dialog(
            context.issue.id,
            payload.response_url.clone(),
            payload.is_message(),
        );
        let dialog = resolve_dialog(callback.encode());

        self.slack
            .open_dialog(integration.bot_token(), trigger_id, &dialog)
            .await?;
        Metrics::dialog_opened();
        info!("opened resolve dialog for issue {}", context.issue.id);
        Ok(())
    }

    async fn apply(
        &self,
        action: &RoutedAction,
        context: &IssueContext,
        actor: &Actor,
    ) -> Result<String, ActionError> {
        let issue_id = context.issue.id;
        let line = match action {
            RoutedAction::Status(change) => {
                self.issues
                    .update_issue_status(issue_id, change.status, change.resolution)
                    .await?;
                info!(
                    "issue {} set to {} by user {}",
                    issue_id,
                    change.status.as_str(),
                    actor.user.id
                );
                status_text(change, &actor.external_id)
            }
            RoutedAction::Assign { username } => {
                let assignee = self
                    .organizations
                    .get_user_by_username(username)
                    .await?
                    .ok_or_else(|| {
                        ActionError::Rejected("Cannot assign to non-members.".to_string())
                    })?;
                if !self
                    .permissions
                    .is_active_member(context.organization.id, &assignee)
                    .await?
                {
                    return Err(ActionError::Rejected(
                        "Cannot assign to non-members.".to_string(),
                    ));
                }

                self.issues
                    .set_issue_assignee(issue_id, Some(assignee.id))
                    .await?;
                info!(
                    "issue {} assigned to user {} by user {}",
                    issue_id, assignee.id, actor.user.id
                );

                let label = match self
                    .resolver
                    .external_id_for_user(&actor.provider, &assignee)
                    .await?
                {
                    Some(external_id) => slack_mention(&external_id),
                    None => assignee.display_name().to_string(),
                };
                assign_text(&label, &actor.external_id)
            }
            RoutedAction::Unassign => {
                self.issues.set_issue_assignee(issue_id, None).await?;
                info!("issue {} unassigned by user {}", issue_id, actor.user.id);
                unassign_text(&actor.external_id)
            }
            RoutedAction::OpenResolveDialog => {
                return Err(ActionError::UnsupportedAction(
                    "resolve_dialog cannot be applied as a mutation".to_string(),
                ));
            }
        };
        Metrics::action_applied();
        Ok(line)
    }

    async fn refresh_issue(&self, context: &mut IssueContext) -> Result<(), ActionError> {
        if let Some(issue) = self.issues.get_issue(context.issue.id).await? {
            context.issue = issue;
        }
        Ok(())
    }
}
