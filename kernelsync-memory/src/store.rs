//! In-memory storage implementation emulating a single-node CouchDB server.
//!
//! Databases hold documents in ordered maps so `_all_docs` rows come back sorted by
//! id, as they do on a real server. All state sits behind async-aware read-write locks.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use serde_json::{Value, json};
use uuid::Uuid;

use kernelsync_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{
        AllDocs, AllDocsRow, ConfigEntry, Membership, RawDocument, RowValue, SecurityObject,
        ServerInfo, WriteResult,
    },
    error::{SyncError, SyncResult},
};

/// Node name a freshly installed single-node server reports.
pub const DEFAULT_NODE_NAME: &str = "nonode@nohost";

type ConfigMap = BTreeMap<(String, String), String>;

#[derive(Debug, Default)]
struct Database {
    documents: BTreeMap<String, RawDocument>,
    security: Option<SecurityObject>,
}

#[derive(Debug, Default)]
struct ServerState {
    databases: HashMap<String, Database>,
    /// node name -> (section, key) -> value
    config: HashMap<String, ConfigMap>,
}

/// Thread-safe in-memory document store backend.
///
/// `InMemoryStore` is cloneable and uses `Arc`-wrapped internal state, so clones share
/// the same databases, configuration and request log.
///
/// # Example
///
/// ```ignore
/// use kernelsync_memory::InMemoryStore;
/// use kernelsync_core::{backend::StoreBackend, document::RawDocument};
///
/// let store = InMemoryStore::new();
/// store.create_database("projects").await?;
///
/// let written = store.put_document("projects", &RawDocument::with_id("a")).await?;
/// assert!(written.rev.starts_with("1-"));
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    state: Arc<RwLock<ServerState>>,
    requests: Arc<RwLock<Vec<String>>>,
    node: String,
    advertised_nodes: Option<Vec<String>>,
    faults: HashMap<String, u16>,
    request_faults: HashMap<String, u16>,
    read_rewrites: HashMap<String, (String, Value)>,
    unreachable: bool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store whose node is named [`DEFAULT_NODE_NAME`].
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ServerState::default())),
            requests: Arc::new(RwLock::new(Vec::new())),
            node: DEFAULT_NODE_NAME.to_string(),
            advertised_nodes: None,
            faults: HashMap::new(),
            request_faults: HashMap::new(),
            read_rewrites: HashMap::new(),
            unreachable: false,
        }
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom options.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Every request received so far, as `METHOD /path` lines.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    /// Number of recorded requests equal to `line`.
    pub async fn request_count(&self, line: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|request| request.as_str() == line)
            .count()
    }

    pub async fn config_value(&self, node: &str, section: &str, key: &str) -> Option<String> {
        self.state
            .read()
            .await
            .config
            .get(node)
            .and_then(|config| config.get(&(section.to_string(), key.to_string())))
            .cloned()
    }

    pub async fn security(&self, db: &str) -> Option<SecurityObject> {
        self.state
            .read()
            .await
            .databases
            .get(db)
            .and_then(|database| database.security.clone())
    }

    /// Logs the request, failing it when its line (query string excluded) is faulted.
    async fn record(&self, line: String) -> SyncResult<()> {
        let path = line.split_once('?').map_or(line.as_str(), |(path, _)| path);
        let fault = self.request_faults.get(path).copied();
        self.requests.write().await.push(line);

        match fault {
            Some(status) => Err(injected(status)),
            None => Ok(()),
        }
    }

    /// Applies reachability and injected faults before an operation runs.
    fn check(&self, db: Option<&str>) -> SyncResult<()> {
        if self.unreachable {
            return Err(SyncError::Transport {
                message: "connection refused".into(),
                connect: true,
            });
        }

        match db.and_then(|db| self.faults.get(db)) {
            Some(status) => Err(injected(*status)),
            None => Ok(()),
        }
    }
}

fn error_body(error: &str, reason: &str) -> String {
    json!({ "error": error, "reason": reason }).to_string()
}

fn injected(status: u16) -> SyncError {
    SyncError::from_status(status, error_body("injected", &format!("status {status}")))
}

fn missing_database() -> SyncError {
    SyncError::NotFound {
        body: error_body("not_found", "Database does not exist."),
    }
}

fn missing_document() -> SyncError {
    SyncError::NotFound {
        body: error_body("not_found", "missing"),
    }
}

fn update_conflict() -> SyncError {
    SyncError::Conflict {
        body: error_body("conflict", "Document update conflict."),
    }
}

/// Next revision after `current`: the sequence number increments, the suffix is random.
fn next_rev(current: Option<&str>) -> String {
    let seq = current
        .and_then(|rev| rev.split_once('-'))
        .and_then(|(seq, _)| seq.parse::<u64>().ok())
        .unwrap_or(0);

    format!("{}-{}", seq + 1, Uuid::new_v4().simple())
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn server_info(&self) -> SyncResult<ServerInfo> {
        self.record("GET /".into()).await?;
        self.check(None)?;

        Ok(ServerInfo {
            couchdb: "Welcome".into(),
            version: "3.3.3".into(),
            uuid: Some(Uuid::new_v4().simple().to_string()),
        })
    }

    async fn database_exists(&self, db: &str) -> SyncResult<bool> {
        let checked = self
            .record(format!("HEAD /{db}"))
            .await
            .and_then(|()| self.check(Some(db)));

        match checked {
            Ok(()) => Ok(self.state.read().await.databases.contains_key(db)),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn create_database(&self, db: &str) -> SyncResult<()> {
        self.record(format!("PUT /{db}")).await?;
        self.check(Some(db))?;

        let mut state = self.state.write().await;
        if state.databases.contains_key(db) {
            return Err(SyncError::PreconditionFailed {
                body: error_body(
                    "file_exists",
                    "The database could not be created, the file already exists.",
                ),
            });
        }
        state.databases.insert(db.to_string(), Database::default());

        Ok(())
    }

    async fn all_docs(&self, db: &str) -> SyncResult<AllDocs> {
        self.record(format!("GET /{db}/_all_docs")).await?;
        self.check(Some(db))?;

        let state = self.state.read().await;
        let database = state.databases.get(db).ok_or_else(missing_database)?;

        let rows = database
            .documents
            .iter()
            .map(|(id, doc)| AllDocsRow {
                id: id.clone(),
                key: Some(id.clone()),
                value: doc.rev().map(|rev| RowValue { rev: rev.to_string() }),
            })
            .collect::<Vec<_>>();

        Ok(AllDocs {
            total_rows: rows.len() as u64,
            offset: Some(0),
            rows,
        })
    }

    async fn get_document(&self, db: &str, id: &str) -> SyncResult<RawDocument> {
        self.record(format!("GET /{db}/{id}")).await?;
        self.check(Some(db))?;

        let state = self.state.read().await;
        let database = state.databases.get(db).ok_or_else(missing_database)?;

        let mut document = database
            .documents
            .get(id)
            .cloned()
            .ok_or_else(missing_document)?;
        if let Some((field, value)) = self.read_rewrites.get(db) {
            document.insert(field.clone(), value.clone());
        }

        Ok(document)
    }

    async fn put_document(&self, db: &str, document: &RawDocument) -> SyncResult<WriteResult> {
        let id = document.require_id()?.to_string();
        self.record(format!("PUT /{db}/{id}")).await?;
        self.check(Some(db))?;

        let mut state = self.state.write().await;
        let database = state.databases.get_mut(db).ok_or_else(missing_database)?;

        let current = database.documents.get(&id).and_then(|doc| doc.rev());
        if current != document.rev() {
            return Err(update_conflict());
        }

        let rev = next_rev(current);
        let mut stored = document.clone();
        stored.set_rev(rev.clone());
        database.documents.insert(id.clone(), stored);

        Ok(WriteResult { ok: true, id, rev })
    }

    async fn delete_document(&self, db: &str, id: &str, rev: &str) -> SyncResult<WriteResult> {
        self.record(format!("DELETE /{db}/{id}?rev={rev}")).await?;
        self.check(Some(db))?;

        let mut state = self.state.write().await;
        let database = state.databases.get_mut(db).ok_or_else(missing_database)?;

        let current = database
            .documents
            .get(id)
            .ok_or_else(missing_document)?
            .rev()
            .map(str::to_string);
        if current.as_deref() != Some(rev) {
            return Err(update_conflict());
        }

        database.documents.remove(id);

        Ok(WriteResult {
            ok: true,
            id: id.to_string(),
            rev: next_rev(Some(rev)),
        })
    }

    async fn put_security(&self, db: &str, security: &SecurityObject) -> SyncResult<()> {
        self.record(format!("PUT /{db}/_security")).await?;
        self.check(Some(db))?;

        let mut state = self.state.write().await;
        let database = state.databases.get_mut(db).ok_or_else(missing_database)?;
        database.security = Some(security.clone());

        Ok(())
    }

    async fn membership(&self) -> SyncResult<Membership> {
        self.record("GET /_membership".into()).await?;
        self.check(None)?;

        let nodes = self
            .advertised_nodes
            .clone()
            .unwrap_or_else(|| vec![self.node.clone()]);

        Ok(Membership {
            all_nodes: nodes.clone(),
            cluster_nodes: nodes,
        })
    }

    async fn put_config(&self, node: &str, entry: &ConfigEntry) -> SyncResult<String> {
        self.record(format!("PUT /_node/{node}/_config/{}", entry.path())).await?;
        self.check(None)?;

        if node != self.node {
            return Err(SyncError::NotFound {
                body: error_body("not_found", &format!("unknown node {node}")),
            });
        }

        let previous = self
            .state
            .write()
            .await
            .config
            .entry(node.to_string())
            .or_default()
            .insert((entry.section.clone(), entry.key.clone()), entry.value.clone());

        Ok(previous.unwrap_or_default())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryStore::builder()
///     .node_name("couchdb@127.0.0.1")
///     .database("projects")
///     .fault("tasks", 500)
///     .build()
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder {
    node: Option<String>,
    advertised_nodes: Option<Vec<String>>,
    databases: Vec<String>,
    documents: Vec<(String, RawDocument)>,
    faults: HashMap<String, u16>,
    request_faults: HashMap<String, u16>,
    read_rewrites: HashMap<String, (String, Value)>,
    unreachable: bool,
}

impl InMemoryStoreBuilder {
    /// Names the emulated node (default [`DEFAULT_NODE_NAME`]).
    pub fn node_name(mut self, node: &str) -> Self {
        self.node = Some(node.to_string());
        self
    }

    /// Overrides the node list returned by `/_membership`.
    pub fn advertise_nodes(mut self, nodes: &[&str]) -> Self {
        self.advertised_nodes = Some(nodes.iter().map(|node| node.to_string()).collect());
        self
    }

    /// Pre-creates an empty database.
    pub fn database(mut self, db: &str) -> Self {
        self.databases.push(db.to_string());
        self
    }

    /// Seeds a document, creating its database when needed.
    pub fn document(mut self, db: &str, document: RawDocument) -> Self {
        self.documents.push((db.to_string(), document));
        self
    }

    /// Every request touching `db` fails with `status`.
    pub fn fault(mut self, db: &str, status: u16) -> Self {
        self.faults.insert(db.to_string(), status);
        self
    }

    /// Requests whose `METHOD /path` line equals `request` fail with `status`.
    ///
    /// The query string is ignored, so `"DELETE /projects/a"` matches any revision.
    pub fn fail_request(mut self, request: &str, status: u16) -> Self {
        self.request_faults.insert(request.to_string(), status);
        self
    }

    /// Documents read from `db` come back with `field` set to `value`.
    pub fn rewrite_reads(mut self, db: &str, field: &str, value: impl Into<Value>) -> Self {
        self.read_rewrites
            .insert(db.to_string(), (field.to_string(), value.into()));
        self
    }

    /// Every request fails as if the server refused the connection.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds the store; seeding fails only for documents without an `_id`.
    async fn build(self) -> SyncResult<Self::Backend> {
        let mut state = ServerState::default();

        for db in self.databases {
            state.databases.entry(db).or_default();
        }

        for (db, mut document) in self.documents {
            let id = document.require_id()?.to_string();
            document.set_rev(next_rev(None));
            state
                .databases
                .entry(db)
                .or_default()
                .documents
                .insert(id, document);
        }

        Ok(InMemoryStore {
            state: Arc::new(RwLock::new(state)),
            requests: Arc::new(RwLock::new(Vec::new())),
            node: self.node.unwrap_or_else(|| DEFAULT_NODE_NAME.to_string()),
            advertised_nodes: self.advertised_nodes,
            faults: self.faults,
            request_faults: self.request_faults,
            read_rewrites: self.read_rewrites,
            unreachable: self.unreachable,
        })
    }
}
