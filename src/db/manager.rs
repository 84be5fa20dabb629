use std::sync::Arc;

use tracing::info;

use crate::config::{DatabaseConfig, DbType};
use crate::db::sqlite::SqliteStore;
use crate::db::{DatabaseError, IdentityStore, IntegrationStore, IssueStore, OrganizationStore};

const SQLITE_MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        slug TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        is_active INTEGER NOT NULL DEFAULT 1,
        is_superuser INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organization_members (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role TEXT NOT NULL,
        UNIQUE (organization_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS integrations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        provider TEXT NOT NULL,
        external_id TEXT NOT NULL,
        name TEXT NOT NULL,
        access_token TEXT NOT NULL,
        bot_access_token TEXT,
        UNIQUE (provider, external_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organization_integrations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        integration_id INTEGER NOT NULL REFERENCES integrations(id) ON DELETE CASCADE,
        UNIQUE (organization_id, integration_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS identity_providers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        provider_type TEXT NOT NULL,
        organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        UNIQUE (provider_type, organization_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS identities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        idp_id INTEGER NOT NULL REFERENCES identity_providers(id) ON DELETE CASCADE,
        user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        external_id TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'unknown',
        UNIQUE (idp_id, external_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth_providers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL UNIQUE REFERENCES organizations(id) ON DELETE CASCADE,
        provider TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth_identities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        auth_provider_id INTEGER NOT NULL REFERENCES auth_providers(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        ident TEXT NOT NULL,
        UNIQUE (auth_provider_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        slug TEXT NOT NULL,
        name TEXT NOT NULL,
        UNIQUE (organization_id, slug)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS issues (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        short_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        culprit TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'unresolved',
        resolution TEXT,
        assignee_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        last_seen INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_organization_integrations_integration ON organization_integrations(integration_id)",
    "CREATE INDEX IF NOT EXISTS idx_identities_user ON identities(idp_id, user_id)",
    "CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project_id)",
];

#[derive(Clone)]
pub struct DatabaseManager {
    sqlite: SqliteStore,
}

impl DatabaseManager {
    pub fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        match config.db_type() {
            DbType::Sqlite => {
                let path = config.sqlite_path().ok_or_else(|| {
                    DatabaseError::Connection("missing sqlite database path".to_string())
                })?;
                let sqlite = SqliteStore::open(&path, config.max_connections())?;
                Ok(Self { sqlite })
            }
            DbType::Unsupported => Err(DatabaseError::Connection(format!(
                "unsupported database url {}",
                config.connection_string()
            ))),
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        self.sqlite.execute_statements(SQLITE_MIGRATIONS).await?;
        info!("database schema is up to date");
        Ok(())
    }

    pub fn organization_store(&self) -> Arc<dyn OrganizationStore> {
        Arc::new(self.sqlite.clone())
    }

    pub fn integration_store(&self) -> Arc<dyn IntegrationStore> {
        Arc::new(self.sqlite.clone())
    }

    pub fn identity_store(&self) -> Arc<dyn IdentityStore> {
        Arc::new(self.sqlite.clone())
    }

    pub fn issue_store(&self) -> Arc<dyn IssueStore> {
        Arc::new(self.sqlite.clone())
    }
}
