//! Main document store interface.
//!
//! [`DocumentStore`] owns a backend and hands out [`Collection`] handles. Server-wide
//! operations (connectivity, membership, per-node configuration) live here rather
//! than on a collection.
//!
//! # Example
//!
//! ```ignore
//! use kernelsync_core::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! let node = store.membership().await?.first_node().map(str::to_owned);
//! ```

use crate::{
    backend::StoreBackend,
    collection::Collection,
    document::{ConfigEntry, Membership, ServerInfo},
    error::SyncResult,
};

/// Document store over a concrete backend.
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    pub async fn server_info(&self) -> SyncResult<ServerInfo> {
        self.backend.server_info().await
    }

    pub async fn membership(&self) -> SyncResult<Membership> {
        self.backend.membership().await
    }

    /// Writes one configuration value on `node`, returning the previous value.
    pub async fn put_config(&self, node: &str, entry: &ConfigEntry) -> SyncResult<String> {
        self.backend.put_config(node, entry).await
    }

    pub async fn shutdown(self) -> SyncResult<()> {
        self.backend.shutdown().await
    }
}
