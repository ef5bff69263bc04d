//! Behavioural tests for the in-memory backend's CouchDB semantics.

use kernelsync_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{ConfigEntry, RawDocument, SecurityGroup, SecurityObject},
    error::SyncError,
};
use kernelsync_memory::{InMemoryStore, store::DEFAULT_NODE_NAME};

fn named(id: &str, name: &str) -> RawDocument {
    let mut doc = RawDocument::with_id(id);
    doc.insert("name", name);
    doc
}

#[tokio::test]
async fn written_documents_read_back_with_a_revision() {
    let store = InMemoryStore::builder().database("projects").build().await.unwrap();

    let written = store.put_document("projects", &named("p1", "X")).await.unwrap();
    let read = store.get_document("projects", "p1").await.unwrap();

    assert!(written.ok);
    assert_eq!(read.id(), Some("p1"));
    assert_eq!(read.get("name").and_then(|v| v.as_str()), Some("X"));
    assert_eq!(read.rev(), Some(written.rev.as_str()));
}

#[tokio::test]
async fn updates_require_the_current_revision() {
    let store = InMemoryStore::builder().database("projects").build().await.unwrap();
    let first = store.put_document("projects", &named("p1", "X")).await.unwrap();

    // no _rev on an existing document
    let err = store.put_document("projects", &named("p1", "Y")).await.unwrap_err();
    assert!(matches!(err, SyncError::Conflict { .. }));

    let mut update = named("p1", "Y");
    update.set_rev(first.rev.clone());
    let second = store.put_document("projects", &update).await.unwrap();

    assert!(second.rev.starts_with("2-"));
}

#[tokio::test]
async fn delete_with_a_stale_revision_conflicts() {
    let store = InMemoryStore::builder().database("projects").build().await.unwrap();
    let first = store.put_document("projects", &named("p1", "X")).await.unwrap();

    let mut update = named("p1", "Y");
    update.set_rev(first.rev.clone());
    let second = store.put_document("projects", &update).await.unwrap();

    let err = store.delete_document("projects", "p1", &first.rev).await.unwrap_err();
    assert_eq!(err.status(), Some(409));

    store.delete_document("projects", "p1", &second.rev).await.unwrap();
    let err = store.get_document("projects", "p1").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn missing_databases_are_not_found() {
    let store = InMemoryStore::new();

    assert!(store.all_docs("projects").await.unwrap_err().is_not_found());
    assert!(!store.database_exists("projects").await.unwrap());
}

#[tokio::test]
async fn creating_a_database_twice_fails_the_precondition() {
    let store = InMemoryStore::new();

    store.create_database("areas").await.unwrap();
    let err = store.create_database("areas").await.unwrap_err();

    assert!(matches!(err, SyncError::PreconditionFailed { .. }));
    assert!(store.database_exists("areas").await.unwrap());
}

#[tokio::test]
async fn all_docs_rows_are_sorted_by_id() {
    let store = InMemoryStore::builder()
        .document("tasks", RawDocument::with_id("b"))
        .document("tasks", RawDocument::with_id("a"))
        .build()
        .await
        .unwrap();

    let all = store.all_docs("tasks").await.unwrap();

    assert_eq!(all.total_rows, 2);
    assert_eq!(all.ids().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[tokio::test]
async fn configuration_is_scoped_to_the_real_node() {
    let store = InMemoryStore::builder()
        .node_name("couchdb@127.0.0.1")
        .build()
        .await
        .unwrap();
    let entry = ConfigEntry::new("cors", "origins", "*");

    let err = store.put_config(DEFAULT_NODE_NAME, &entry).await.unwrap_err();
    assert!(err.is_not_found());

    let previous = store.put_config("couchdb@127.0.0.1", &entry).await.unwrap();
    assert_eq!(previous, "");
    assert_eq!(
        store.config_value("couchdb@127.0.0.1", "cors", "origins").await.as_deref(),
        Some("*")
    );

    let membership = store.membership().await.unwrap();
    assert_eq!(membership.first_node(), Some("couchdb@127.0.0.1"));
}

#[tokio::test]
async fn security_objects_are_stored_per_database() {
    let store = InMemoryStore::builder().database("userdb-u1-logs").build().await.unwrap();
    let security = SecurityObject {
        admins: SecurityGroup { names: vec!["admin".into()], roles: vec!["_admin".into()] },
        members: SecurityGroup { names: vec!["u1".into()], roles: vec![] },
    };

    store.put_security("userdb-u1-logs", &security).await.unwrap();

    assert_eq!(store.security("userdb-u1-logs").await, Some(security));
}

#[tokio::test]
async fn faults_and_reachability_are_injected() {
    let store = InMemoryStore::builder()
        .database("habits")
        .fault("habits", 401)
        .build()
        .await
        .unwrap();
    assert!(store.all_docs("habits").await.unwrap_err().is_unauthorized());

    let offline = InMemoryStore::builder().unreachable().build().await.unwrap();
    assert!(offline.server_info().await.unwrap_err().is_connect());
}

#[tokio::test]
async fn requests_are_logged_in_order() {
    let store = InMemoryStore::builder().database("logs").build().await.unwrap();

    store.all_docs("logs").await.unwrap();
    store.membership().await.unwrap();
    store.membership().await.unwrap();

    assert_eq!(
        store.requests().await,
        vec!["GET /logs/_all_docs", "GET /_membership", "GET /_membership"]
    );
    assert_eq!(store.request_count("GET /_membership").await, 2);
}

#[tokio::test]
async fn request_faults_match_the_path_and_ignore_the_query() {
    let store = InMemoryStore::builder()
        .document("projects", RawDocument::with_id("p1"))
        .fail_request("DELETE /projects/p1", 503)
        .build()
        .await
        .unwrap();

    let read = store.get_document("projects", "p1").await.unwrap();
    let err = store
        .delete_document("projects", "p1", read.rev().unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(store.all_docs("projects").await.unwrap().total_rows, 1);
    assert_eq!(store.requests().await.len(), 3);
}

#[tokio::test]
async fn rewritten_reads_leave_the_stored_document_alone() {
    let store = InMemoryStore::builder()
        .document("projects", named("p1", "X"))
        .rewrite_reads("projects", "name", "Y")
        .build()
        .await
        .unwrap();

    let read = store.get_document("projects", "p1").await.unwrap();
    assert_eq!(read.get("name").and_then(|name| name.as_str()), Some("Y"));

    // the stored revision is untouched, so an update against it still succeeds
    let mut update = named("p1", "Z");
    update.set_rev(read.rev().unwrap());
    assert!(store.put_document("projects", &update).await.is_ok());
}
