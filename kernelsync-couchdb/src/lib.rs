//! CouchDB backend implementation for kernelsync.
//!
//! This crate provides an HTTP implementation of the `StoreBackend` trait on top of
//! `reqwest`, authenticating every request with HTTP basic auth.
//!
//! To use this backend through the facade crate, keep the `couchdb` feature enabled:
//!
//! ```toml
//! [dependencies]
//! kernelsync = { version = "x.y.z", features = ["couchdb"] }
//! ```
//!
//! # Error mapping
//!
//! Non-success responses are turned into `SyncError` variants by status code, with
//! the response body preserved so the operator sees what the server said. Requests
//! that never produce a response become `SyncError::Transport`.
//!
//! # Example
//!
//! ```ignore
//! use kernelsync_core::backend::StoreBackendBuilder;
//! use kernelsync_couchdb::CouchDbStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = CouchDbStore::builder("http://localhost:5984")
//!         .credentials("admin", "password")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as kernelsync_couchdb;

pub mod store;

pub use store::{CouchDbStore, CouchDbStoreBuilder};
