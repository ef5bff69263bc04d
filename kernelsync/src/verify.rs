//! Write/read/delete round trip against one collection.
//!
//! The first failing step ends the run. Nothing is cleaned up after a failure,
//! so a document written before a failed read stays on the server.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use kernelsync_core::{
    backend::StoreBackend,
    collection::Collection,
    document::{Document, DocumentExt, REV_FIELD, RawDocument, WriteResult},
    error::SyncError,
    store::DocumentStore,
};

/// Synthetic document used to probe write permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Document for ProbeDocument {
    fn id(&self) -> &str {
        &self.id
    }
}

impl ProbeDocument {
    /// A probe whose id is derived from `now` in unix milliseconds.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            id: format!("test-doc-{}", now.timestamp_millis()),
            name: "Direct API Test Project".to_string(),
            description: "Created by kernelsync to verify write permissions".to_string(),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Write,
    Read,
    Delete,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Write => "write",
            Step::Read => "read",
            Step::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    pub step: Step,
    pub error: SyncError,
}

impl Step {
    fn failed(self) -> impl FnOnce(SyncError) -> StepFailure {
        move |error| StepFailure { step: self, error }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundTripReport {
    pub collection: String,
    pub document_id: String,
    pub written: Option<WriteResult>,
    pub read_back: Option<RawDocument>,
    pub deleted: Option<WriteResult>,
    pub failure: Option<StepFailure>,
}

impl RoundTripReport {
    fn new(collection: &str, document_id: &str) -> Self {
        Self {
            collection: collection.to_string(),
            document_id: document_id.to_string(),
            written: None,
            read_back: None,
            deleted: None,
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none() && self.deleted.is_some()
    }

    pub fn failed_at(&self) -> Option<Step> {
        self.failure.as_ref().map(|failure| failure.step)
    }
}

/// Runs the round trip with a typed probe document.
pub async fn verify_read_write<B: StoreBackend>(
    store: &DocumentStore<B>,
    collection: &str,
    probe: &ProbeDocument,
) -> RoundTripReport {
    match probe.to_raw() {
        Ok(document) => round_trip(store, collection, &document).await,
        Err(error) => {
            let mut report = RoundTripReport::new(collection, &probe.id);
            report.failure = Some(StepFailure { step: Step::Write, error });
            report
        }
    }
}

/// Writes `document`, reads it back, then deletes it with the revision just read.
pub async fn round_trip<B: StoreBackend>(
    store: &DocumentStore<B>,
    collection: &str,
    document: &RawDocument,
) -> RoundTripReport {
    let mut report = RoundTripReport::new(collection, document.id().unwrap_or_default());

    if let Err(failure) = run_steps(&store.collection(collection), document, &mut report).await {
        warn!(
            collection,
            id = %report.document_id,
            step = %failure.step,
            status = failure.error.status(),
            error = %failure.error,
            "round trip failed"
        );
        report.failure = Some(failure);
    }

    report
}

async fn run_steps<B: StoreBackend>(
    target: &Collection<'_, B>,
    document: &RawDocument,
    report: &mut RoundTripReport,
) -> Result<(), StepFailure> {
    let id = document.require_id().map_err(Step::Write.failed())?;

    let written = target.put(document).await.map_err(Step::Write.failed())?;
    info!(id, rev = %written.rev, "document written");
    report.written = Some(written);

    let read = target.get(id).await.map_err(Step::Read.failed())?;
    let rev = read.rev().unwrap_or_default().to_string();
    let checked = check_read_back(document, &read);
    report.read_back = Some(read);
    checked.map_err(Step::Read.failed())?;

    let deleted = target.delete(id, &rev).await.map_err(Step::Delete.failed())?;
    info!(id, rev = %deleted.rev, "document deleted");
    report.deleted = Some(deleted);

    Ok(())
}

/// The read-back must carry every written field unchanged plus a non-empty `_rev`.
fn check_read_back(written: &RawDocument, read: &RawDocument) -> Result<(), SyncError> {
    if let Some((field, _)) = written
        .fields()
        .filter(|(field, _)| field.as_str() != REV_FIELD)
        .find(|(field, value)| read.get(field) != Some(*value))
    {
        return Err(SyncError::InvalidDocument(format!(
            "field `{field}` does not match what was written"
        )));
    }

    match read.rev() {
        Some(rev) if !rev.is_empty() => Ok(()),
        _ => Err(SyncError::InvalidDocument(
            "read-back document has no revision".into(),
        )),
    }
}

impl fmt::Display for RoundTripReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Read/write test against [{}]", self.collection)?;
        writeln!(f, "Document: {}", self.document_id)?;

        if let Some(written) = &self.written {
            writeln!(f, "Write successful (rev {})", written.rev)?;
        }
        if let Some(read) = &self.read_back {
            if self.failed_at() != Some(Step::Read) {
                writeln!(f, "Read successful")?;
            }
            writeln!(f, "Document content: {}", read.to_pretty())?;
        }
        if self.deleted.is_some() {
            writeln!(f, "Delete successful")?;
        }

        if let Some(failure) = &self.failure {
            writeln!(f, "Operation failed at {}: {}", failure.step, failure.error)?;
            if let Some(status) = failure.error.status() {
                writeln!(f, "   Status: {status}")?;
            }
            if let Some(body) = failure.error.body() {
                writeln!(f, "   Data: {body}")?;
            }
        }

        Ok(())
    }
}
