//! Per-user database provisioning.
//!
//! Each user gets one database per collection, named `userdb-{user}-{collection}`,
//! readable by that user and administered by the server admin.

use std::fmt;

use tracing::{info, warn};

use kernelsync_core::{
    backend::StoreBackend,
    document::{SecurityGroup, SecurityObject},
    error::SyncError,
    store::DocumentStore,
};

pub fn user_database_name(user_id: &str, collection: &str) -> String {
    format!("userdb-{user_id}-{collection}")
}

/// Admin by name and `_admin` role; the user as the only member.
pub fn user_security(admin: &str, user_id: &str) -> SecurityObject {
    SecurityObject {
        admins: SecurityGroup {
            names: vec![admin.to_string()],
            roles: vec!["_admin".to_string()],
        },
        members: SecurityGroup {
            names: vec![user_id.to_string()],
            roles: Vec::new(),
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionStatus {
    /// Created and secured.
    Created,
    /// Already existed; security re-applied.
    Secured,
    CheckFailed(SyncError),
    CreateFailed(SyncError),
    SecureFailed(SyncError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDatabaseReport {
    pub name: String,
    pub status: ProvisionStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionReport {
    pub user_id: String,
    pub databases: Vec<UserDatabaseReport>,
}

impl ProvisionReport {
    pub fn status(&self, collection: &str) -> Option<&ProvisionStatus> {
        let name = user_database_name(&self.user_id, collection);

        self.databases
            .iter()
            .find(|report| report.name == name)
            .map(|report| &report.status)
    }
}

/// Ensures every per-user database exists and carries the user's security object.
pub async fn provision_user<B: StoreBackend>(
    store: &DocumentStore<B>,
    admin: &str,
    user_id: &str,
    collections: &[String],
) -> ProvisionReport {
    let security = user_security(admin, user_id);
    let mut databases = Vec::with_capacity(collections.len());

    for collection in collections {
        let name = user_database_name(user_id, collection);
        let database = store.collection(&name);

        let status = match database.exists().await {
            Ok(false) => match database.create().await {
                Ok(()) => match database.secure(&security).await {
                    Ok(()) => ProvisionStatus::Created,
                    Err(err) => ProvisionStatus::SecureFailed(err),
                },
                Err(err) => ProvisionStatus::CreateFailed(err),
            },
            Ok(true) => match database.secure(&security).await {
                Ok(()) => ProvisionStatus::Secured,
                Err(err) => ProvisionStatus::SecureFailed(err),
            },
            Err(err) => ProvisionStatus::CheckFailed(err),
        };

        match &status {
            ProvisionStatus::Created | ProvisionStatus::Secured => {
                info!(database = %name, ?status, "user database ready")
            }
            _ => warn!(database = %name, ?status, "user database not ready"),
        }

        databases.push(UserDatabaseReport { name, status });
    }

    ProvisionReport {
        user_id: user_id.to_string(),
        databases,
    }
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Checking databases for user: {}", self.user_id)?;

        for report in &self.databases {
            let name = &report.name;
            match &report.status {
                ProvisionStatus::Created => writeln!(f, "Created and secured database: {name}")?,
                ProvisionStatus::Secured => writeln!(f, "Secured database: {name}")?,
                ProvisionStatus::CheckFailed(err) => {
                    writeln!(f, "Error checking database {name}: {err}")?
                }
                ProvisionStatus::CreateFailed(err) => {
                    writeln!(f, "Failed to create database {name}: {err}")?
                }
                ProvisionStatus::SecureFailed(err) => {
                    writeln!(f, "Failed to secure database {name}: {err}")?
                }
            }
        }

        Ok(())
    }
}
