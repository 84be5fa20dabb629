pub use self::error::DatabaseError;
pub use self::manager::DatabaseManager;
pub use self::models::{
    Identity, IdentityStatus, Integration, Issue, IssueStatus, Organization, Project, Resolution,
    User,
};
pub use self::stores::{IdentityStore, IntegrationStore, IssueStore, OrganizationStore};

pub mod error;
pub mod manager;
pub mod models;
pub mod schema;
pub mod sqlite;
pub mod stores;
