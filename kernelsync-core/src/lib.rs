//! Core types for talking to the Kernel sync document store.
//!
//! This crate is the foundation of the kernelsync workspace and provides:
//!
//! - **Document model** ([`document`]) - Raw CouchDB documents and the wire shapes around them
//! - **Store backend abstraction** ([`backend`]) - The async trait every transport implements
//! - **Collections interface** ([`collection`]) - A handle bound to one named database
//! - **Document store** ([`store`]) - Entry point wrapping a backend
//! - **Error handling** ([`error`]) - The status-aware error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use kernelsync_core::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! let all = store.collection("projects").all_docs().await?;
//! println!("projects: {} documents", all.total_rows);
//! ```

#[allow(unused_extern_crates)]
extern crate self as kernelsync_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod store;
