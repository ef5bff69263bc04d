//! Runtime configuration.
//!
//! Defaults match a local development server, so running without a configuration
//! file talks to `http://localhost:5984` as `admin`. Values are layered as
//! defaults, then an optional TOML file, then environment overrides.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use kernelsync_core::error::{SyncError, SyncResult};

use crate::cors::DEFAULT_NODE;

pub const DEFAULT_URL: &str = "http://localhost:5984";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "password";

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "kernelsync.toml";

/// The databases the Kernel client syncs, in declaration order.
pub const DEFAULT_COLLECTIONS: [&str; 7] = [
    "projects",
    "areas",
    "tasks",
    "resources",
    "habits",
    "metrics",
    "logs",
];

pub const ENV_URL: &str = "COUCHDB_URL";
pub const ENV_USERNAME: &str = "COUCHDB_USER";
pub const ENV_PASSWORD: &str = "COUCHDB_PASSWORD";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub collections: Vec<String>,
    /// Per-request timeout; unset means a hung request blocks the run.
    pub timeout_secs: Option<u64>,
    /// Collection the read/write probe document goes to.
    pub verify_collection: String,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Node alias tried first by `cors` before asking `/_membership`.
    pub default_node: String,
    /// `cors/origins` written by `cors`.
    pub origins: String,
    /// `cors/origins` written by `init`.
    pub init_origins: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            collections: DEFAULT_COLLECTIONS.iter().map(|name| name.to_string()).collect(),
            timeout_secs: None,
            verify_collection: "projects".to_string(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            default_node: DEFAULT_NODE.to_string(),
            origins: "*".to_string(),
            init_origins: "http://localhost:5173, http://127.0.0.1:5173".to_string(),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing default file is not.
    pub fn load(path: Option<&Path>) -> SyncResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let raw = fs::read_to_string(&path).map_err(|e| {
            SyncError::Configuration(format!("failed to read config file {path:?}: {e}"))
        })?;

        Self::from_toml(&raw)
            .map_err(|e| SyncError::Configuration(format!("{path:?}: {e}")))
    }

    pub fn from_toml(raw: &str) -> SyncResult<Self> {
        toml::from_str(raw)
            .map_err(|e| SyncError::Configuration(format!("failed to parse config: {e}")))
    }

    /// Applies `COUCHDB_URL`, `COUCHDB_USER` and `COUCHDB_PASSWORD` from the process environment.
    pub fn apply_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(ENV_URL) {
            self.url = url;
        }
        if let Some(username) = lookup(ENV_USERNAME) {
            self.username = username;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.password = password;
        }

        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
