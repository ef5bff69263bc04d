//! CORS configuration on the server node.
//!
//! Per-node configuration lives under `/_node/{node}/_config`. The updater first
//! addresses a default alias; when the server answers 404 for it, the real node name
//! is read from `/_membership` and the write is retried once under that name.

use std::fmt;

use tracing::{info, warn};

use kernelsync_core::{
    backend::StoreBackend,
    document::ConfigEntry,
    error::{SyncError, SyncResult},
    store::DocumentStore,
};

/// Node alias of a default single-node installation.
pub const DEFAULT_NODE: &str = "nonode@nohost";

pub const CORS_METHODS: &str = "GET, PUT, POST, HEAD, DELETE";
pub const CORS_HEADERS: &str = "accept, authorization, content-type, origin, referer";

/// The CORS settings the browser client needs, with `enable_cors` placed in `enable_section`.
pub fn cors_entries(enable_section: &str, origins: &str) -> Vec<ConfigEntry> {
    vec![
        ConfigEntry::new(enable_section, "enable_cors", "true"),
        ConfigEntry::new("cors", "origins", origins),
        ConfigEntry::new("cors", "credentials", "true"),
        ConfigEntry::new("cors", "methods", CORS_METHODS),
        ConfigEntry::new("cors", "headers", CORS_HEADERS),
    ]
}

/// Asks `/_membership` for the first node name.
pub async fn resolve_node<B: StoreBackend>(store: &DocumentStore<B>) -> SyncResult<String> {
    store
        .membership()
        .await?
        .first_node()
        .map(str::to_string)
        .ok_or(SyncError::EmptyMembership)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOutcome {
    Set {
        node: String,
        /// `true` when the write only succeeded under the resolved node.
        fallback: bool,
    },
    Failed {
        error: SyncError,
        fallback_attempted: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigReport {
    pub entry: ConfigEntry,
    pub outcome: ConfigOutcome,
}

impl ConfigReport {
    pub fn is_set(&self) -> bool {
        matches!(self.outcome, ConfigOutcome::Set { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorsReport {
    pub entries: Vec<ConfigReport>,
}

impl CorsReport {
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.is_set()).count()
    }
}

/// Writes `entry` under `default_node`, falling back to the membership node once on 404.
pub async fn set_with_fallback<B: StoreBackend>(
    store: &DocumentStore<B>,
    default_node: &str,
    entry: &ConfigEntry,
) -> ConfigOutcome {
    match store.put_config(default_node, entry).await {
        Ok(_) => ConfigOutcome::Set {
            node: default_node.to_string(),
            fallback: false,
        },
        Err(err) if err.is_not_found() => {
            info!(node = default_node, key = %entry.path(), "node alias not found, resolving via membership");

            let retried: SyncResult<String> = async {
                let node = resolve_node(store).await?;
                store.put_config(&node, entry).await?;
                Ok(node)
            }
            .await;

            match retried {
                Ok(node) => ConfigOutcome::Set { node, fallback: true },
                Err(error) => ConfigOutcome::Failed {
                    error,
                    fallback_attempted: true,
                },
            }
        }
        Err(error) => ConfigOutcome::Failed {
            error,
            fallback_attempted: false,
        },
    }
}

/// Applies every entry in order; a failed key is reported and skipped.
pub async fn update_cors<B: StoreBackend>(
    store: &DocumentStore<B>,
    default_node: &str,
    entries: &[ConfigEntry],
) -> CorsReport {
    let mut reports = Vec::with_capacity(entries.len());

    for entry in entries {
        let outcome = set_with_fallback(store, default_node, entry).await;

        if let ConfigOutcome::Failed { error, .. } = &outcome {
            warn!(key = %entry.path(), %error, "failed to set configuration value");
        }

        reports.push(ConfigReport {
            entry: entry.clone(),
            outcome,
        });
    }

    CorsReport { entries: reports }
}

impl fmt::Display for ConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = &self.entry;

        match &self.outcome {
            ConfigOutcome::Set { fallback: false, .. } => {
                writeln!(f, "Set {} = \"{}\"", entry.path(), entry.value)
            }
            ConfigOutcome::Set { node, fallback: true } => {
                writeln!(f, "Set (node: {node}) {} = \"{}\"", entry.path(), entry.value)
            }
            ConfigOutcome::Failed { error, .. } => {
                writeln!(f, "Failed to set {}: {error}", entry.key)
            }
        }
    }
}

impl fmt::Display for CorsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entries
            .iter()
            .try_for_each(|entry| write!(f, "{entry}"))?;
        writeln!(f, "CORS configuration complete. Reload the app page.")
    }
}
