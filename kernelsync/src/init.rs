//! First-run server preparation: connectivity, CORS, collection databases.

use std::fmt;

use tracing::{info, warn};

use kernelsync_core::{
    backend::StoreBackend,
    document::{ConfigEntry, ServerInfo},
    error::SyncError,
    store::DocumentStore,
};

use crate::cors::resolve_node;

#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseStatus {
    Created,
    AlreadyExists,
    Failed(SyncError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseReport {
    pub name: String,
    pub status: DatabaseStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CorsSetup {
    Configured {
        node: String,
        entries: Vec<ConfigEntry>,
    },
    /// Stopped at the first failure; `applied` holds what was written before it.
    Failed {
        node: Option<String>,
        applied: Vec<ConfigEntry>,
        error: SyncError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitReport {
    pub server: Result<ServerInfo, SyncError>,
    /// `None` when the server was unreachable and nothing else ran.
    pub cors: Option<CorsSetup>,
    pub databases: Vec<DatabaseReport>,
}

impl InitReport {
    pub fn database(&self, name: &str) -> Option<&DatabaseStatus> {
        self.databases
            .iter()
            .find(|report| report.name == name)
            .map(|report| &report.status)
    }
}

/// Checks connectivity, configures CORS on the membership node, then creates each database.
///
/// An unreachable server ends the run. A CORS failure is reported and database
/// creation still proceeds.
pub async fn initialize<B: StoreBackend>(
    store: &DocumentStore<B>,
    collections: &[String],
    cors_entries: &[ConfigEntry],
) -> InitReport {
    let server = store.server_info().await;
    if let Err(err) = &server {
        warn!(error = %err, "could not connect to the document store");
        return InitReport {
            server,
            cors: None,
            databases: Vec::new(),
        };
    }

    let cors = configure_cors(store, cors_entries).await;

    let mut databases = Vec::with_capacity(collections.len());
    for name in collections {
        let status = match store.collection(name).create().await {
            Ok(()) => DatabaseStatus::Created,
            Err(SyncError::PreconditionFailed { .. }) => DatabaseStatus::AlreadyExists,
            Err(err) => {
                warn!(database = %name, error = %err, "failed to create database");
                DatabaseStatus::Failed(err)
            }
        };
        info!(database = %name, ?status, "database checked");

        databases.push(DatabaseReport {
            name: name.clone(),
            status,
        });
    }

    InitReport {
        server,
        cors: Some(cors),
        databases,
    }
}

async fn configure_cors<B: StoreBackend>(
    store: &DocumentStore<B>,
    entries: &[ConfigEntry],
) -> CorsSetup {
    let node = match resolve_node(store).await {
        Ok(node) => node,
        Err(error) => {
            return CorsSetup::Failed {
                node: None,
                applied: Vec::new(),
                error,
            };
        }
    };

    let mut applied = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Err(error) = store.put_config(&node, entry).await {
            warn!(%node, key = %entry.path(), %error, "failed to configure CORS");
            return CorsSetup::Failed {
                node: Some(node),
                applied,
                error,
            };
        }
        applied.push(entry.clone());
    }

    CorsSetup::Configured { node, entries: applied }
}

impl fmt::Display for InitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.server {
            Ok(info) => writeln!(f, "Connected to CouchDB {}", info.version)?,
            Err(err) => {
                writeln!(f, "Could not connect to CouchDB: {err}")?;
                if err.is_connect() {
                    writeln!(f, "   Make sure CouchDB is running.")?;
                }
                return Ok(());
            }
        }

        match &self.cors {
            Some(CorsSetup::Configured { node, entries }) => {
                writeln!(f, "Targeting CouchDB node: {node}")?;
                for entry in entries {
                    writeln!(f, "   Set [{}] {} = \"{}\"", entry.section, entry.key, entry.value)?;
                }
                writeln!(f, "CORS configured successfully")?;
            }
            Some(CorsSetup::Failed { error, .. }) => {
                writeln!(f, "Failed to configure CORS: {error}")?;
                if let Some(body) = error.body() {
                    writeln!(f, "   Data: {body}")?;
                }
            }
            None => {}
        }

        for report in &self.databases {
            match &report.status {
                DatabaseStatus::Created => writeln!(f, "Created database: {}", report.name)?,
                DatabaseStatus::AlreadyExists => {
                    writeln!(f, "Database already exists: {}", report.name)?
                }
                DatabaseStatus::Failed(err) => {
                    writeln!(f, "Failed to create {}: {err}", report.name)?
                }
            }
        }

        writeln!(f, "Initialization complete!")
    }
}
