use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sql_types::BigInt;
use diesel::sqlite::SqliteConnection;
use tracing::debug;

use super::DatabaseError;
use super::models::{
    AuthIdentity, AuthProvider, Identity, IdentityProvider, Integration, Issue, IssueStatus,
    NewAuthIdentity, NewAuthProvider, NewIdentity, NewIdentityProvider, NewIntegration, NewIssue,
    NewOrganization, NewOrganizationIntegration, NewOrganizationMember, NewProject, NewUser,
    Organization, OrganizationMember, Project, Resolution, User,
};
use super::stores::{IdentityStore, IntegrationStore, IssueStore, OrganizationStore};
use crate::db::schema::{
    auth_identities, auth_providers, identities, identity_providers, integrations, issues,
    organization_integrations, organization_members, organizations, projects, users,
};

pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;",
        )
        .map_err(r2d2::Error::QueryError)
    }
}

fn last_insert_rowid(conn: &mut SqliteConnection) -> Result<i64, DatabaseError> {
    diesel::select(sql::<BigInt>("last_insert_rowid()"))
        .get_result::<i64>(conn)
        .map_err(Into::into)
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn open(path: &str, max_connections: u32) -> Result<Self, DatabaseError> {
        let manager = ConnectionManager::<SqliteConnection>::new(path);
        let pool = r2d2::Pool::builder()
            .max_size(max_connections)
            .connection_customizer(Box::new(SqlitePragmas))
            .build(manager)
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        debug!("opened sqlite pool at {} (max {})", path, max_connections);
        Ok(Self { pool })
    }

    pub async fn execute_statements(
        &self,
        statements: &'static [&'static str],
    ) -> Result<(), DatabaseError> {
        self.run(move |conn| {
            for statement in statements {
                diesel::sql_query(*statement)
                    .execute(conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }
            Ok(())
        })
        .await
    }

    async fn run<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, DatabaseError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::Connection(e.to_string()))?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

#[async_trait]
impl OrganizationStore for SqliteStore {
    async fn create_organization(
        &self,
        slug: &str,
        name: &str,
    ) -> Result<Organization, DatabaseError> {
        let new = NewOrganization {
            slug: slug.to_string(),
            name: name.to_string(),
        };
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::insert_into(organizations::table)
                    .values(&new)
                    .execute(conn)?;
                let id = last_insert_rowid(conn)?;
                Ok(organizations::table
                    .find(id)
                    .select(Organization::as_select())
                    .first(conn)?)
            })
        })
        .await
    }

    async fn get_organization(&self, id: i64) -> Result<Option<Organization>, DatabaseError> {
        self.run(move |conn| {
            Ok(organizations::table
                .find(id)
                .select(Organization::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::insert_into(users::table).values(&user).execute(conn)?;
                let id = last_insert_rowid(conn)?;
                Ok(users::table.find(id).select(User::as_select()).first(conn)?)
            })
        })
        .await
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        self.run(move |conn| {
            Ok(users::table
                .find(id)
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let username = username.to_string();
        self.run(move |conn| {
            Ok(users::table
                .filter(users::username.eq(username))
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn add_member(
        &self,
        organization_id: i64,
        user_id: i64,
        role: &str,
    ) -> Result<OrganizationMember, DatabaseError> {
        let new = NewOrganizationMember {
            organization_id,
            user_id,
            role: role.to_string(),
        };
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::insert_into(organization_members::table)
                    .values(&new)
                    .execute(conn)?;
                let id = last_insert_rowid(conn)?;
                Ok(organization_members::table
                    .find(id)
                    .select(OrganizationMember::as_select())
                    .first(conn)?)
            })
        })
        .await
    }

    async fn get_member(
        &self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<Option<OrganizationMember>, DatabaseError> {
        self.run(move |conn| {
            Ok(organization_members::table
                .filter(organization_members::organization_id.eq(organization_id))
                .filter(organization_members::user_id.eq(user_id))
                .select(OrganizationMember::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn create_auth_provider(
        &self,
        organization_id: i64,
        provider: &str,
    ) -> Result<AuthProvider, DatabaseError> {
        let new = NewAuthProvider {
            organization_id,
            provider: provider.to_string(),
        };
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::insert_into(auth_providers::table)
                    .values(&new)
                    .execute(conn)?;
                let id = last_insert_rowid(conn)?;
                Ok(auth_providers::table
                    .find(id)
                    .select(AuthProvider::as_select())
                    .first(conn)?)
            })
        })
        .await
    }

    async fn get_auth_provider(
        &self,
        organization_id: i64,
    ) -> Result<Option<AuthProvider>, DatabaseError> {
        self.run(move |conn| {
            Ok(auth_providers::table
                .filter(auth_providers::organization_id.eq(organization_id))
                .select(AuthProvider::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn create_auth_identity(
        &self,
        auth_provider_id: i64,
        user_id: i64,
        ident: &str,
    ) -> Result<AuthIdentity, DatabaseError> {
        let new = NewAuthIdentity {
            auth_provider_id,
            user_id,
            ident: ident.to_string(),
        };
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::insert_into(auth_identities::table)
                    .values(&new)
                    .execute(conn)?;
                let id = last_insert_rowid(conn)?;
                Ok(auth_identities::table
                    .find(id)
                    .select(AuthIdentity::as_select())
                    .first(conn)?)
            })
        })
        .await
    }

    async fn get_auth_identity(
        &self,
        auth_provider_id: i64,
        user_id: i64,
    ) -> Result<Option<AuthIdentity>, DatabaseError> {
        self.run(move |conn| {
            Ok(auth_identities::table
                .filter(auth_identities::auth_provider_id.eq(auth_provider_id))
                .filter(auth_identities::user_id.eq(user_id))
                .select(AuthIdentity::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }
}

#[async_trait]
impl IntegrationStore for SqliteStore {
    async fn create_integration(
        &self,
        integration: NewIntegration,
    ) -> Result<Integration, DatabaseError> {
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::insert_into(integrations::table)
                    .values(&integration)
                    .execute(conn)?;
                let id = last_insert_rowid(conn)?;
                Ok(integrations::table
                    .find(id)
                    .select(Integration::as_select())
                    .first(conn)?)
            })
        })
        .await
    }

    async fn get_integration_by_external_id(
        &self,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<Integration>, DatabaseError> {
        let provider = provider.to_string();
        let external_id = external_id.to_string();
        self.run(move |conn| {
            Ok(integrations::table
                .filter(integrations::provider.eq(provider))
                .filter(integrations::external_id.eq(external_id))
                .select(Integration::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn link_organization(
        &self,
        integration_id: i64,
        organization_id: i64,
    ) -> Result<(), DatabaseError> {
        let new = NewOrganizationIntegration {
            organization_id,
            integration_id,
        };
        self.run(move |conn| {
            diesel::insert_into(organization_integrations::table)
                .values(&new)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn get_organization_ids(&self, integration_id: i64) -> Result<Vec<i64>, DatabaseError> {
        self.run(move |conn| {
            Ok(organization_integrations::table
                .filter(organization_integrations::integration_id.eq(integration_id))
                .select(organization_integrations::organization_id)
                .load::<i64>(conn)?)
        })
        .await
    }

    async fn delete_integration(&self, id: i64) -> Result<(), DatabaseError> {
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::delete(
                    organization_integrations::table
                        .filter(organization_integrations::integration_id.eq(id)),
                )
                .execute(conn)?;
                let deleted = diesel::delete(integrations::table.find(id)).execute(conn)?;
                if deleted == 0 {
                    return Err(DatabaseError::NotFound(format!("integration {id}")));
                }
                Ok(())
            })
        })
        .await
    }
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn create_identity_provider(
        &self,
        provider_type: &str,
        organization_id: i64,
    ) -> Result<IdentityProvider, DatabaseError> {
        let new = NewIdentityProvider {
            provider_type: provider_type.to_string(),
            organization_id,
        };
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::insert_into(identity_providers::table)
                    .values(&new)
                    .execute(conn)?;
                let id = last_insert_rowid(conn)?;
                Ok(identity_providers::table
                    .find(id)
                    .select(IdentityProvider::as_select())
                    .first(conn)?)
            })
        })
        .await
    }

    async fn get_identity_provider(
        &self,
        provider_type: &str,
        organization_id: i64,
    ) -> Result<Option<IdentityProvider>, DatabaseError> {
        let provider_type = provider_type.to_string();
        self.run(move |conn| {
            Ok(identity_providers::table
                .filter(identity_providers::provider_type.eq(provider_type))
                .filter(identity_providers::organization_id.eq(organization_id))
                .select(IdentityProvider::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn create_identity(&self, identity: NewIdentity) -> Result<Identity, DatabaseError> {
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::insert_into(identities::table)
                    .values(&identity)
                    .execute(conn)?;
                let id = last_insert_rowid(conn)?;
                Ok(identities::table
                    .find(id)
                    .select(Identity::as_select())
                    .first(conn)?)
            })
        })
        .await
    }

    async fn get_identity_by_external_id(
        &self,
        idp_id: i64,
        external_id: &str,
    ) -> Result<Option<Identity>, DatabaseError> {
        let external_id = external_id.to_string();
        self.run(move |conn| {
            Ok(identities::table
                .filter(identities::idp_id.eq(idp_id))
                .filter(identities::external_id.eq(external_id))
                .select(Identity::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn get_identity_for_user(
        &self,
        idp_id: i64,
        user_id: i64,
    ) -> Result<Option<Identity>, DatabaseError> {
        self.run(move |conn| {
            Ok(identities::table
                .filter(identities::idp_id.eq(idp_id))
                .filter(identities::user_id.eq(user_id))
                .select(Identity::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }
}

#[async_trait]
impl IssueStore for SqliteStore {
    async fn create_project(
        &self,
        organization_id: i64,
        slug: &str,
        name: &str,
    ) -> Result<Project, DatabaseError> {
        let new = NewProject {
            organization_id,
            slug: slug.to_string(),
            name: name.to_string(),
        };
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::insert_into(projects::table)
                    .values(&new)
                    .execute(conn)?;
                let id = last_insert_rowid(conn)?;
                Ok(projects::table
                    .find(id)
                    .select(Project::as_select())
                    .first(conn)?)
            })
        })
        .await
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>, DatabaseError> {
        self.run(move |conn| {
            Ok(projects::table
                .find(id)
                .select(Project::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn create_issue(&self, issue: NewIssue) -> Result<Issue, DatabaseError> {
        self.run(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                diesel::insert_into(issues::table)
                    .values(&issue)
                    .execute(conn)?;
                let id = last_insert_rowid(conn)?;
                Ok(issues::table
                    .find(id)
                    .select(Issue::as_select())
                    .first(conn)?)
            })
        })
        .await
    }

    async fn get_issue(&self, id: i64) -> Result<Option<Issue>, DatabaseError> {
        self.run(move |conn| {
            Ok(issues::table
                .find(id)
                .select(Issue::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn update_issue_status(
        &self,
        id: i64,
        status: IssueStatus,
        resolution: Option<Resolution>,
    ) -> Result<(), DatabaseError> {
        self.run(move |conn| {
            let updated = diesel::update(issues::table.find(id))
                .set((
                    issues::status.eq(status.as_str()),
                    issues::resolution.eq(resolution.map(|r| r.as_str())),
                ))
                .execute(conn)?;
            if updated == 0 {
                return Err(DatabaseError::NotFound(format!("issue {id}")));
            }
            Ok(())
        })
        .await
    }

    async fn set_issue_assignee(
        &self,
        id: i64,
        assignee_id: Option<i64>,
    ) -> Result<(), DatabaseError> {
        self.run(move |conn| {
            let updated = diesel::update(issues::table.find(id))
                .set(issues::assignee_id.eq(assignee_id))
                .execute(conn)?;
            if updated == 0 {
                return Err(DatabaseError::NotFound(format!("issue {id}")));
            }
            Ok(())
        })
        .await
    }
}
