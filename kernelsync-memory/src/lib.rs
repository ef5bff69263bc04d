//! In-memory document store backend for kernelsync.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait
//! that follows CouchDB's status semantics: revision tokens on every write, 404 for
//! missing databases and documents, 409 for stale revisions, 412 when creating a
//! database twice, and per-node configuration addressed by node name.
//!
//! # Features
//!
//! - **Revision tracking** - `N-<hex>` revisions, checked on update and delete
//! - **Cluster emulation** - A single named node with membership and configuration
//! - **Fault injection** - Force a status for a database, or make the server unreachable
//! - **Request log** - Every call is recorded as an HTTP-style line for assertions
//!
//! # Quick Start
//!
//! ```ignore
//! use kernelsync_core::{backend::StoreBackendBuilder, store::DocumentStore};
//! use kernelsync_memory::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = InMemoryStore::builder()
//!         .database("projects")
//!         .build()
//!         .await
//!         .unwrap();
//!     let store = DocumentStore::new(backend);
//!
//!     assert!(store.collection("projects").exists().await.unwrap());
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as kernelsync_memory;

pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
