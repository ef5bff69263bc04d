//! Collection enumeration against the in-memory backend.

use serde_json::json;

use kernelsync::{
    backend::StoreBackendBuilder,
    document::RawDocument,
    enumerate::{CollectionDetail, CollectionOutcome, EnumerateMode, SAMPLE_LIMIT, enumerate},
    memory::InMemoryStore,
    store::DocumentStore,
};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

#[tokio::test]
async fn empty_collection_reports_zero_without_a_sample_fetch() {
    let backend = InMemoryStore::builder().database("projects").build().await.unwrap();
    let store = DocumentStore::new(backend.clone());

    let report = enumerate(&store, &names(&["projects"]), EnumerateMode::Sample).await;

    assert_eq!(report.to_string(), "projects: 0 documents\n");
    assert_eq!(backend.requests().await, vec!["GET /projects/_all_docs"]);
}

#[tokio::test]
async fn every_collection_is_queried_exactly_once_despite_failures() {
    let backend = InMemoryStore::builder()
        .database("projects")
        .database("tasks")
        .database("logs")
        .fault("areas", 401)
        .fault("tasks", 500)
        .build()
        .await
        .unwrap();
    let store = DocumentStore::new(backend.clone());
    let collections = names(&["projects", "areas", "tasks", "resources", "logs"]);

    let report = enumerate(&store, &collections, EnumerateMode::Sample).await;

    for name in &collections {
        assert_eq!(backend.request_count(&format!("GET /{name}/_all_docs")).await, 1);
    }
    assert_eq!(
        report.collections.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        vec!["projects", "areas", "tasks", "resources", "logs"]
    );
    assert_eq!(report.failures(), 2);
    assert!(matches!(
        &report.get("areas").unwrap().outcome,
        CollectionOutcome::Failed(err) if err.is_unauthorized()
    ));
    assert_eq!(report.get("resources").unwrap().outcome, CollectionOutcome::Missing);
    assert!(matches!(
        report.get("logs").unwrap().outcome,
        CollectionOutcome::Counted { total_rows: 0, .. }
    ));
}

#[tokio::test]
async fn sample_mode_fetches_and_truncates_the_first_document() {
    let mut first = RawDocument::with_id("a-project");
    first.insert("description", "x".repeat(300));
    let backend = InMemoryStore::builder()
        .document("projects", first)
        .document("projects", RawDocument::with_id("b-project"))
        .build()
        .await
        .unwrap();
    let store = DocumentStore::new(backend.clone());

    let report = enumerate(&store, &names(&["projects"]), EnumerateMode::Sample).await;

    let CollectionOutcome::Counted { total_rows, detail } = &report.get("projects").unwrap().outcome else {
        panic!("projects should have been counted");
    };
    assert_eq!(*total_rows, 2);
    let CollectionDetail::Sample(sample) = detail else {
        panic!("expected a sample, got {detail:?}");
    };
    assert_eq!(sample.chars().count(), SAMPLE_LIMIT);
    assert_eq!(backend.request_count("GET /projects/a-project").await, 1);
    assert!(report.to_string().starts_with("projects: 2 documents\n   Sample: {"));
}

#[tokio::test]
async fn list_mode_reports_every_id_without_fetching_documents() {
    let backend = InMemoryStore::builder()
        .document("habits", RawDocument::from_value(json!({ "_id": "h2" })).unwrap())
        .document("habits", RawDocument::from_value(json!({ "_id": "h1" })).unwrap())
        .build()
        .await
        .unwrap();
    let store = DocumentStore::new(backend.clone());

    let report = enumerate(&store, &names(&["habits"]), EnumerateMode::ListIds).await;

    assert_eq!(
        report.get("habits").unwrap().outcome,
        CollectionOutcome::Counted {
            total_rows: 2,
            detail: CollectionDetail::Ids(vec!["h1".into(), "h2".into()]),
        }
    );
    assert_eq!(backend.requests().await.len(), 1);
    assert_eq!(report.to_string(), "habits: 2 documents\n   - h1\n   - h2\n");
}

#[tokio::test]
async fn missing_and_unauthorized_collections_render_distinctly() {
    let backend = InMemoryStore::builder().fault("metrics", 401).build().await.unwrap();
    let store = DocumentStore::new(backend);

    let report = enumerate(&store, &names(&["logs", "metrics"]), EnumerateMode::ListIds).await;
    let rendered = report.to_string();

    assert!(rendered.contains("logs: database does not exist yet"));
    assert!(rendered.contains("metrics: error: Unauthorized (401): check the configured username and password"));
}

#[tokio::test]
async fn list_mode_marks_an_empty_collection() {
    let backend = InMemoryStore::builder().database("metrics").build().await.unwrap();
    let store = DocumentStore::new(backend.clone());

    let report = enumerate(&store, &names(&["metrics"]), EnumerateMode::ListIds).await;

    assert_eq!(
        report.get("metrics").unwrap().outcome,
        CollectionOutcome::Counted {
            total_rows: 0,
            detail: CollectionDetail::Ids(Vec::new()),
        }
    );
    assert_eq!(report.to_string(), "metrics: 0 documents\n   (no documents)\n");
    assert_eq!(backend.requests().await.len(), 1);
}
