//! Verification and provisioning toolkit for the Kernel sync store.
//!
//! The Kernel client syncs its collections to a CouchDB server. This crate bundles the
//! operational workflows run against that server, generic over any
//! [`StoreBackend`](backend::StoreBackend):
//!
//! - [`enumerate`] - count documents per collection, show a sample or list the ids
//! - [`cors`] - enable CORS on the server node, resolving the node name on 404
//! - [`verify`] - write, read back and delete a probe document
//! - [`init`] - connectivity check, CORS, and creation of the collection databases
//! - [`provision`] - per-user databases with a security object
//!
//! Workflows never fail as a whole: each returns a report recording what happened to
//! every item, and the reports render as the status lines the `kernelsync` binary prints.
//!
//! # Quick Start
//!
//! ```ignore
//! use kernelsync::{prelude::*, memory::InMemoryStore, enumerate::{enumerate, EnumerateMode}};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = DocumentStore::new(
//!         InMemoryStore::builder().database("projects").build().await.unwrap(),
//!     );
//!
//!     let report = enumerate(&store, &["projects".to_string()], EnumerateMode::Sample).await;
//!     print!("{report}"); // projects: 0 documents
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-process CouchDB emulation for development and testing
//! - [`couchdb`] - HTTP backend (requires the `couchdb` feature, on by default)
//!
//! The `kernelsync` binary and its CLI dependencies sit behind the `cli` feature, also
//! on by default.

pub mod config;
pub mod cors;
pub mod enumerate;
pub mod init;
pub mod prelude;
pub mod provision;
pub mod verify;

pub use kernelsync_core::{backend, collection, document, error, store};

/// In-memory storage backend implementations.
pub mod memory {
    pub use kernelsync_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// CouchDB HTTP backend implementations.
///
/// This module is only available when the `couchdb` feature is enabled.
#[cfg(feature = "couchdb")]
pub mod couchdb {
    pub use kernelsync_couchdb::{CouchDbStore, CouchDbStoreBuilder};
}
