//! Collection handles for document store operations.
//!
//! A collection is one named database on the server. [`Collection`] binds a name to
//! a backend reference so callers do not thread the database name through every call.
//!
//! # Example
//!
//! ```ignore
//! let projects = store.collection("projects");
//! let all = projects.all_docs().await?;
//! println!("{} documents", all.total_rows);
//! if let Some(id) = all.first_id() {
//!     println!("{}", projects.get(id).await?);
//! }
//! ```

use crate::{
    backend::StoreBackend,
    document::{AllDocs, RawDocument, SecurityObject, WriteResult},
    error::SyncResult,
};

/// An untyped collection with a reference to a storage backend.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    pub async fn exists(&self) -> SyncResult<bool> {
        self.backend.database_exists(&self.name).await
    }

    /// Creates the backing database.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::PreconditionFailed`](crate::error::SyncError::PreconditionFailed)
    /// when the database already exists.
    pub async fn create(&self) -> SyncResult<()> {
        self.backend.create_database(&self.name).await
    }

    pub async fn all_docs(&self) -> SyncResult<AllDocs> {
        self.backend.all_docs(&self.name).await
    }

    pub async fn get(&self, id: &str) -> SyncResult<RawDocument> {
        self.backend.get_document(&self.name, id).await
    }

    pub async fn put(&self, document: &RawDocument) -> SyncResult<WriteResult> {
        self.backend
            .put_document(&self.name, document)
            .await
    }

    pub async fn delete(&self, id: &str, rev: &str) -> SyncResult<WriteResult> {
        self.backend
            .delete_document(&self.name, id, rev)
            .await
    }

    pub async fn secure(&self, security: &SecurityObject) -> SyncResult<()> {
        self.backend
            .put_security(&self.name, security)
            .await
    }
}
