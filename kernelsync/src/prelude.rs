//! Convenient re-exports of commonly used types from kernelsync.
//!
//! ```ignore
//! use kernelsync::prelude::*;
//! ```

pub use kernelsync_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    collection::Collection,
    document::{ConfigEntry, Document, DocumentExt, RawDocument},
    error::{SyncError, SyncResult},
    store::DocumentStore,
};

pub use crate::config::SyncConfig;
