use async_trait::async_trait;

use super::DatabaseError;
use super::models::{
    AuthIdentity, AuthProvider, Identity, IdentityProvider, Integration, Issue, IssueStatus,
    NewIdentity, NewIntegration, NewIssue, NewUser, Organization, OrganizationMember, Project,
    Resolution, User,
};

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn create_organization(
        &self,
        slug: &str,
        name: &str,
    ) -> Result<Organization, DatabaseError>;
    async fn get_organization(&self, id: i64) -> Result<Option<Organization>, DatabaseError>;
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn get_user(&self, id: i64) -> Result<Option<User>, DatabaseError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;
    async fn add_member(
        &self,
        organization_id: i64,
        user_id: i64,
        role: &str,
    ) -> Result<OrganizationMember, DatabaseError>;
    async fn get_member(
        &self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<Option<OrganizationMember>, DatabaseError>;
    async fn create_auth_provider(
        &self,
        organization_id: i64,
        provider: &str,
    ) -> Result<AuthProvider, DatabaseError>;
    async fn get_auth_provider(
        &self,
        organization_id: i64,
    ) -> Result<Option<AuthProvider>, DatabaseError>;
    async fn create_auth_identity(
        &self,
        auth_provider_id: i64,
        user_id: i64,
        ident: &str,
    ) -> Result<AuthIdentity, DatabaseError>;
    async fn get_auth_identity(
        &self,
        auth_provider_id: i64,
        user_id: i64,
    ) -> Result<Option<AuthIdentity>, DatabaseError>;
}

#[async_trait]
pub trait IntegrationStore: Send + Sync {
    async fn create_integration(
        &self,
        integration: NewIntegration,
    ) -> Result<Integration, DatabaseError>;
    async fn get_integration_by_external_id(
        &self,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Integration>, DatabaseError>;
    async fn link_organization(
        &self,
        integration_id: i64,
        organization_id: i64,
    ) -> Result<(), DatabaseError>;
    async fn get_organization_ids(&self, integration_id: i64) -> Result<Vec<i64>, DatabaseError>;
    async fn delete_integration(&self, id: i64) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn create_identity_provider(
        &self,
        provider_type: &str,
        organization_id: i64,
    ) -> Result<IdentityProvider, DatabaseError>;
    async fn get_identity_provider(
        &self,
        provider_type: &str,
        organization_id: i64,
    ) -> Result<Option<IdentityProvider>, DatabaseError>;
    async fn create_identity(&self, identity: NewIdentity) -> Result<Identity, DatabaseError>;
    async fn get_identity_by_external_id(
        &self,
        idp_id: i64,
        external_id: &str,
    ) -> Result<Option<Identity>, DatabaseError>;
    async fn get_identity_for_user(
        &self,
        idp_id: i64,
        user_id: i64,
    ) -> Result<Option<Identity>, DatabaseError>;
}

#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn create_project(
        &self,
        organization_id: i64,
        slug: &str,
        name: &str,
    ) -> Result<Project, DatabaseError>;
    async fn get_project(&self, id: i64) -> Result<Option<Project>, DatabaseError>;
    async fn create_issue(&self, issue: NewIssue) -> Result<Issue, DatabaseError>;
    async fn get_issue(&self, id: i64) -> Result<Option<Issue>, DatabaseError>;
    async fn update_issue_status(
        &self,
        id: i64,
        status: IssueStatus,
        resolution: Option<Resolution>,
    ) -> Result<(), DatabaseError>;
    async fn set_issue_assignee(
        &self,
        id: i64,
        assignee_id: Option<i64>,
    ) -> Result<(), DatabaseError>;
}
