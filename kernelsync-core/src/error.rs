//! Error types and result types for document store operations.
//!
//! Every failure keeps whatever the server told us: the HTTP status code and
//! the raw response body. Use [`SyncResult<T>`] as the return type for
//! fallible operations.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to a document store.
///
/// The HTTP variants are produced from a status code with [`SyncError::from_status`];
/// callers that branch on a condition (a missing database, a stale revision) match
/// on the variant instead of comparing raw numbers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The request never produced a response (DNS, refused connection, timeout).
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        /// `true` when the failure happened while establishing the connection.
        connect: bool,
    },
    /// HTTP 401. The configured credentials were rejected.
    #[error("Unauthorized (401): check the configured username and password")]
    Unauthorized { body: String },
    /// HTTP 404. Missing database, document or configuration path.
    #[error("Not found (404): {body}")]
    NotFound { body: String },
    /// HTTP 409. The supplied revision is not the current one.
    #[error("Conflict (409): {body}")]
    Conflict { body: String },
    /// HTTP 412. Usually a database that already exists.
    #[error("Precondition failed (412): {body}")]
    PreconditionFailed { body: String },
    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The membership endpoint answered but listed no nodes.
    #[error("Membership lists no cluster nodes")]
    EmptyMembership,
    /// Serialization/deserialization error when converting to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The document violates structural expectations (missing `_id`, not an object).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// Error during client construction.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// Error while loading configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A specialized `Result` type for document store operations.
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Maps a non-success HTTP status and its body to the matching variant.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();

        match status {
            401 => SyncError::Unauthorized { body },
            404 => SyncError::NotFound { body },
            409 => SyncError::Conflict { body },
            412 => SyncError::PreconditionFailed { body },
            status => SyncError::Http { status, body },
        }
    }

    /// The HTTP status code carried by this error, if the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Unauthorized { .. } => Some(401),
            SyncError::NotFound { .. } => Some(404),
            SyncError::Conflict { .. } => Some(409),
            SyncError::PreconditionFailed { .. } => Some(412),
            SyncError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The response body carried by this error, if the server responded.
    pub fn body(&self) -> Option<&str> {
        match self {
            SyncError::Unauthorized { body }
            | SyncError::NotFound { body }
            | SyncError::Conflict { body }
            | SyncError::PreconditionFailed { body }
            | SyncError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Unauthorized { .. })
    }

    /// `true` when the server could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, SyncError::Transport { connect: true, .. })
    }
}

impl From<SerdeJsonError> for SyncError {
    fn from(err: SerdeJsonError) -> Self {
        SyncError::Serialization(err.to_string())
    }
}
