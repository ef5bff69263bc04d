//! Storage backend abstraction for the document store.
//!
//! The [`StoreBackend`] trait is the seam between the workflows and the transport.
//! The HTTP client in `kernelsync-couchdb` implements it against a live server,
//! `kernelsync-memory` implements it in process with the same status semantics.
//!
//! # Examples
//!
//! ```ignore
//! use kernelsync_core::backend::StoreBackend;
//! use kernelsync_core::document::RawDocument;
//!
//! let mut doc = RawDocument::with_id("test-doc-1");
//! doc.insert("name", "X");
//! let written = backend.put_document("projects", &doc).await?;
//! backend.delete_document("projects", "test-doc-1", &written.rev).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    document::{
        AllDocs, ConfigEntry, Membership, RawDocument, SecurityObject, ServerInfo, WriteResult,
    },
    error::SyncResult,
};

/// Abstract interface for document store backends.
///
/// Every method maps to exactly one request against the store. Non-success
/// responses surface as the matching [`SyncError`](crate::error::SyncError)
/// variant with the status code and body preserved; implementations never
/// retry on their own.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// `GET /`: server banner, doubles as a connectivity check.
    async fn server_info(&self) -> SyncResult<ServerInfo>;

    /// `HEAD /{db}`: `Ok(false)` on 404, any other failure is an error.
    async fn database_exists(&self, db: &str) -> SyncResult<bool>;

    /// `PUT /{db}`: fails with `PreconditionFailed` when the database exists.
    async fn create_database(&self, db: &str) -> SyncResult<()>;

    /// `GET /{db}/_all_docs`.
    async fn all_docs(&self, db: &str) -> SyncResult<AllDocs>;

    /// `GET /{db}/{id}`.
    async fn get_document(&self, db: &str, id: &str) -> SyncResult<RawDocument>;

    /// `PUT /{db}/{id}` where `id` is taken from the document's `_id`.
    ///
    /// Updating an existing document requires its current `_rev` in the body.
    async fn put_document(&self, db: &str, document: &RawDocument) -> SyncResult<WriteResult>;

    /// `DELETE /{db}/{id}?rev={rev}`.
    async fn delete_document(&self, db: &str, id: &str, rev: &str) -> SyncResult<WriteResult>;

    /// `PUT /{db}/_security`.
    async fn put_security(&self, db: &str, security: &SecurityObject) -> SyncResult<()>;

    /// `GET /_membership`.
    async fn membership(&self) -> SyncResult<Membership>;

    /// `PUT /_node/{node}/_config/{section}/{key}`.
    ///
    /// Returns the previous value reported by the server (empty when unset).
    async fn put_config(&self, node: &str, entry: &ConfigEntry) -> SyncResult<String>;

    /// Releases any resources held by the backend.
    async fn shutdown(self) -> SyncResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn server_info(&self) -> SyncResult<ServerInfo> {
        (*self).server_info().await
    }

    async fn database_exists(&self, db: &str) -> SyncResult<bool> {
        (*self).database_exists(db).await
    }

    async fn create_database(&self, db: &str) -> SyncResult<()> {
        (*self).create_database(db).await
    }

    async fn all_docs(&self, db: &str) -> SyncResult<AllDocs> {
        (*self).all_docs(db).await
    }

    async fn get_document(&self, db: &str, id: &str) -> SyncResult<RawDocument> {
        (*self).get_document(db, id).await
    }

    async fn put_document(&self, db: &str, document: &RawDocument) -> SyncResult<WriteResult> {
        (*self).put_document(db, document).await
    }

    async fn delete_document(&self, db: &str, id: &str, rev: &str) -> SyncResult<WriteResult> {
        (*self)
            .delete_document(db, id, rev)
            .await
    }

    async fn put_security(&self, db: &str, security: &SecurityObject) -> SyncResult<()> {
        (*self).put_security(db, security).await
    }

    async fn membership(&self) -> SyncResult<Membership> {
        (*self).membership().await
    }

    async fn put_config(&self, node: &str, entry: &ConfigEntry) -> SyncResult<String> {
        (*self).put_config(node, entry).await
    }
}

/// Factory trait for creating backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    /// The backend type this builder produces.
    type Backend: StoreBackend;

    /// Builds and returns a configured backend instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be initialized.
    async fn build(self) -> SyncResult<Self::Backend>;
}
