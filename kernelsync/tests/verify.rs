//! Write/read/delete round trip against the in-memory backend.

use chrono::{TimeZone, Utc};
use serde_json::json;

use kernelsync::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::RawDocument,
    memory::InMemoryStore,
    store::DocumentStore,
    verify::{ProbeDocument, Step, round_trip, verify_read_write},
};

#[tokio::test]
async fn written_document_is_read_back_and_deleted() {
    let backend = InMemoryStore::builder().database("projects").build().await.unwrap();
    let store = DocumentStore::new(backend.clone());
    let document =
        RawDocument::from_value(json!({ "_id": "test-doc-1700000000000", "name": "X" })).unwrap();

    let report = round_trip(&store, "projects", &document).await;

    assert!(report.is_success(), "{report}");
    let read = report.read_back.as_ref().unwrap();
    assert_eq!(read.id(), Some("test-doc-1700000000000"));
    assert_eq!(read.get("name"), Some(&json!("X")));
    assert!(!read.rev().unwrap().is_empty());
    assert_eq!(read.rev(), Some(report.written.as_ref().unwrap().rev.as_str()));
    assert_eq!(
        backend.requests().await,
        vec![
            "PUT /projects/test-doc-1700000000000".to_string(),
            "GET /projects/test-doc-1700000000000".to_string(),
            format!("DELETE /projects/test-doc-1700000000000?rev={}", read.rev().unwrap()),
        ]
    );
    assert_eq!(backend.all_docs("projects").await.unwrap().total_rows, 0);
}

#[tokio::test]
async fn typed_probe_round_trips_every_field() {
    let backend = InMemoryStore::builder().database("projects").build().await.unwrap();
    let store = DocumentStore::new(backend);
    let probe = ProbeDocument::at(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap());

    let report = verify_read_write(&store, "projects", &probe).await;

    assert!(report.is_success(), "{report}");
    assert_eq!(report.document_id, "test-doc-1700000000000");
    let read = report.read_back.unwrap();
    assert_eq!(read.get("name"), Some(&json!("Direct API Test Project")));
    assert!(read.get("createdAt").is_some());
}

#[tokio::test]
async fn missing_collection_stops_at_the_write() {
    let backend = InMemoryStore::new();
    let store = DocumentStore::new(backend.clone());

    let report = round_trip(&store, "projects", &RawDocument::with_id("test-doc-1")).await;

    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.step, Step::Write);
    assert_eq!(failure.error.status(), Some(404));
    assert!(report.written.is_none());
    assert_eq!(backend.requests().await.len(), 1);

    let rendered = report.to_string();
    assert!(rendered.contains("Operation failed at write"));
    assert!(rendered.contains("   Status: 404"));
    assert!(rendered.contains("   Data: {\"error\":\"not_found\""));
}

#[tokio::test]
async fn server_errors_end_the_run_without_cleanup() {
    let backend = InMemoryStore::builder()
        .database("projects")
        .fault("projects", 500)
        .build()
        .await
        .unwrap();
    let store = DocumentStore::new(backend.clone());

    let report = round_trip(&store, "projects", &RawDocument::with_id("test-doc-2")).await;

    assert!(!report.is_success());
    assert_eq!(report.failure.unwrap().error.status(), Some(500));
    assert!(backend.requests().await.iter().all(|line| !line.starts_with("DELETE")));
}

#[tokio::test]
async fn documents_without_an_id_fail_before_any_request() {
    let backend = InMemoryStore::builder().database("projects").build().await.unwrap();
    let store = DocumentStore::new(backend.clone());
    let document = RawDocument::from_value(json!({ "name": "X" })).unwrap();

    let report = round_trip(&store, "projects", &document).await;

    assert_eq!(report.failure.unwrap().step, Step::Write);
    assert!(backend.requests().await.is_empty());
}

#[tokio::test]
async fn failed_read_leaves_the_written_document_in_place() {
    let backend = InMemoryStore::builder()
        .database("projects")
        .fail_request("GET /projects/test-doc-3", 500)
        .build()
        .await
        .unwrap();
    let store = DocumentStore::new(backend.clone());

    let report = round_trip(&store, "projects", &RawDocument::with_id("test-doc-3")).await;

    assert!(report.written.is_some());
    assert!(report.read_back.is_none());
    assert_eq!(report.failed_at(), Some(Step::Read));
    assert_eq!(report.failure.as_ref().unwrap().error.status(), Some(500));
    assert!(backend.requests().await.iter().all(|line| !line.starts_with("DELETE")));
    assert_eq!(backend.all_docs("projects").await.unwrap().total_rows, 1);
}

#[tokio::test]
async fn mismatched_read_back_is_reported_with_its_content_and_not_deleted() {
    let backend = InMemoryStore::builder()
        .database("projects")
        .rewrite_reads("projects", "name", "Y")
        .build()
        .await
        .unwrap();
    let store = DocumentStore::new(backend.clone());
    let document =
        RawDocument::from_value(json!({ "_id": "test-doc-5", "name": "X" })).unwrap();

    let report = round_trip(&store, "projects", &document).await;

    assert!(report.written.is_some());
    assert_eq!(report.failed_at(), Some(Step::Read));
    assert_eq!(report.read_back.as_ref().unwrap().get("name"), Some(&json!("Y")));
    assert!(backend.requests().await.iter().all(|line| !line.starts_with("DELETE")));
    assert_eq!(backend.all_docs("projects").await.unwrap().total_rows, 1);

    let rendered = report.to_string();
    assert!(!rendered.contains("Read successful"));
    assert!(rendered.contains("\"name\": \"Y\""));
    assert!(rendered.contains("Operation failed at read"));
}

#[tokio::test]
async fn failed_delete_reports_status_and_body() {
    let backend = InMemoryStore::builder()
        .database("projects")
        .fail_request("DELETE /projects/test-doc-4", 503)
        .build()
        .await
        .unwrap();
    let store = DocumentStore::new(backend.clone());

    let report = round_trip(&store, "projects", &RawDocument::with_id("test-doc-4")).await;

    assert!(report.read_back.is_some());
    assert!(report.deleted.is_none());
    assert_eq!(report.failed_at(), Some(Step::Delete));
    assert_eq!(backend.all_docs("projects").await.unwrap().total_rows, 1);

    let rendered = report.to_string();
    assert!(rendered.contains("Read successful"));
    assert!(rendered.contains("Operation failed at delete"));
    assert!(rendered.contains("   Status: 503"));
    assert!(rendered.contains("   Data: {\"error\":\"injected\""));
}
