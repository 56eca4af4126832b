//! Sync Pipeline Integration Tests
//!
//! Every test runs a real HTTP round trip: the pipeline fetches from a
//! stand-in repository and posts SPARQL updates to an embedded triplestore
//! started for that test alone.

mod common;

use common::{seed_title, titles, turtle_document, RepositoryFixture};
use ldsync::config::StoreFlavor;
use ldsync::store::EmbeddedTriplestore;
use ldsync::{Operation, RdfFormat, SyncConfig, SyncError, SyncPipeline};
use std::collections::HashMap;
use std::sync::Arc;

fn pipeline_for(store: &EmbeddedTriplestore, accept: RdfFormat) -> SyncPipeline {
    let mut config = SyncConfig::new(&store.update_url());
    config.triplestore_query_url = Some(store.query_url());
    config.accept = accept;
    config.timeout_secs = 5;
    SyncPipeline::new(config).unwrap()
}

#[tokio::test]
async fn test_update_indexes_current_triples() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    repository.put("/objects/123", "text/turtle", &turtle_document("Test"));

    let pipeline = pipeline_for(&store, RdfFormat::Turtle);
    let event = repository.event("/objects/123", Operation::Update);
    let result = pipeline.synchronize(&event).await.unwrap();

    assert_eq!(result.identifier, "/objects/123");
    assert_eq!(result.operation, Operation::Update);
    assert_eq!(result.triples_changed, Some(1));

    let subject = repository.subject_uri("/objects/123");
    assert_eq!(titles(store.store(), &subject), vec!["Test"]);
    assert_eq!(store.triple_count().unwrap(), 1);

    let requests = repository.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/rest/objects/123");
    assert_eq!(requests[0].accept.as_deref(), Some("text/turtle"));

    store.shutdown().await;
}

#[tokio::test]
async fn test_update_replaces_stale_triples_only_for_subject() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    let subject = repository.subject_uri("/objects/123");
    let neighbour = repository.subject_uri("/objects/456");
    seed_title(store.store(), &subject, "Old title");
    seed_title(store.store(), &subject, "Older title");
    seed_title(store.store(), &neighbour, "Untouched");
    repository.put("/objects/123", "text/turtle", &turtle_document("New title"));

    let pipeline = pipeline_for(&store, RdfFormat::Turtle);
    pipeline.synchronize(&repository.event("/objects/123", Operation::Update)).await.unwrap();

    assert_eq!(titles(store.store(), &subject), vec!["New title"]);
    assert_eq!(titles(store.store(), &neighbour), vec!["Untouched"]);
}

#[tokio::test]
async fn test_repeated_update_is_idempotent() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    repository.put("/objects/123", "text/turtle", &turtle_document("Test"));
    let pipeline = pipeline_for(&store, RdfFormat::Turtle);
    let event = repository.event("/objects/123", Operation::Update);

    pipeline.synchronize(&event).await.unwrap();
    let after_first = store.triple_count().unwrap();
    pipeline.synchronize(&event).await.unwrap();

    assert_eq!(store.triple_count().unwrap(), after_first);
    assert_eq!(titles(store.store(), &repository.subject_uri("/objects/123")), vec!["Test"]);
}

#[tokio::test]
async fn test_fetch_not_found_leaves_store_untouched() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    let subject = repository.subject_uri("/objects/123");
    seed_title(store.store(), &subject, "Indexed earlier");

    let pipeline = pipeline_for(&store, RdfFormat::Turtle);
    let err = pipeline
        .synchronize(&repository.event("/objects/123", Operation::Update))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Fetch { status: Some(404), .. }));
    assert!(err.is_retryable());
    assert_eq!(titles(store.store(), &subject), vec!["Indexed earlier"]);
}

#[tokio::test]
async fn test_fetch_server_error_is_reported_with_status() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    repository.fail("/objects/123", 503);

    let pipeline = pipeline_for(&store, RdfFormat::NTriples);
    let err = pipeline
        .synchronize(&repository.event("/objects/123", Operation::Create))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(err.stage(), "fetch");
}

#[tokio::test]
async fn test_missing_identifier_makes_no_network_call() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    let pipeline = pipeline_for(&store, RdfFormat::Turtle);

    let mut headers = HashMap::new();
    headers.insert("org.fcrepo.jms.baseURL".to_string(), repository.base_url());

    let err = pipeline.synchronize_headers(&headers).await.unwrap_err();
    assert_eq!(err, SyncError::MissingIdentifier);
    assert!(!err.is_retryable());
    assert!(repository.requests().is_empty());
}

#[tokio::test]
async fn test_delete_removes_triples_without_fetching() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    let subject = repository.subject_uri("/objects/123");
    let neighbour = repository.subject_uri("/objects/1234");
    seed_title(store.store(), &subject, "Test");
    seed_title(store.store(), &neighbour, "Prefix sibling");

    let pipeline = pipeline_for(&store, RdfFormat::Turtle);
    let result =
        pipeline.synchronize(&repository.event("/objects/123", Operation::Delete)).await.unwrap();

    assert_eq!(result.operation, Operation::Delete);
    assert_eq!(result.triples_changed, None);
    assert!(titles(store.store(), &subject).is_empty());
    assert_eq!(titles(store.store(), &neighbour), vec!["Prefix sibling"]);
    assert!(repository.requests().is_empty());
}

#[tokio::test]
async fn test_hash_uri_triples_follow_their_resource() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    let with_part = "@prefix dc: <http://purl.org/dc/elements/1.1/> .\n\
                     <> dc:title \"Parent\" ; dc:relation <#part> .\n\
                     <#part> dc:title \"Part\" .\n";
    repository.put("/objects/123", "text/turtle", with_part);

    let pipeline = pipeline_for(&store, RdfFormat::Turtle);
    let event = repository.event("/objects/123", Operation::Update);
    let result = pipeline.synchronize(&event).await.unwrap();
    assert_eq!(result.triples_changed, Some(3));

    let part = format!("{}#part", repository.subject_uri("/objects/123"));
    assert_eq!(titles(store.store(), &part), vec!["Part"]);

    repository.put("/objects/123", "text/turtle", &turtle_document("Parent"));
    pipeline.synchronize(&event).await.unwrap();

    assert!(titles(store.store(), &part).is_empty());
    assert_eq!(store.triple_count().unwrap(), 1);
}

#[tokio::test]
async fn test_response_content_type_decides_parser() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    let subject = repository.subject_uri("/objects/9");
    let ntriples = format!("<{}> <{}> \"Served as N-Triples\" .\n", subject, common::DC_TITLE);
    repository.put("/objects/9", "application/n-triples; charset=utf-8", &ntriples);

    // Asked for Turtle, answered with N-Triples
    let pipeline = pipeline_for(&store, RdfFormat::Turtle);
    pipeline.synchronize(&repository.event("/objects/9", Operation::Update)).await.unwrap();

    assert_eq!(titles(store.store(), &subject), vec!["Served as N-Triples"]);
}

#[tokio::test]
async fn test_malformed_document_aborts_before_delete() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    let subject = repository.subject_uri("/objects/123");
    seed_title(store.store(), &subject, "Still here");
    repository.put("/objects/123", "text/turtle", "<> this is not turtle");

    let pipeline = pipeline_for(&store, RdfFormat::Turtle);
    let err = pipeline
        .synchronize(&repository.event("/objects/123", Operation::Update))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::InvalidDocument(_)));
    assert_eq!(titles(store.store(), &subject), vec!["Still here"]);
}

#[tokio::test]
async fn test_form_encoded_updates() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    repository.put("/objects/123", "text/turtle", &turtle_document("Via form"));

    let mut config = SyncConfig::new(&store.update_url());
    config.store_flavor = StoreFlavor::Form;
    config.accept = RdfFormat::Turtle;
    let pipeline = SyncPipeline::new(config).unwrap();
    pipeline.synchronize(&repository.event("/objects/123", Operation::Update)).await.unwrap();

    assert_eq!(titles(store.store(), &repository.subject_uri("/objects/123")), vec!["Via form"]);
}

#[tokio::test]
async fn test_rejected_delete_reports_delete_stage() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    repository.put("/objects/123", "text/turtle", &turtle_document("Test"));

    // Nothing is served under this path
    let config = SyncConfig::new(&format!("{}/missing", store.base_url()));
    let pipeline = SyncPipeline::new(config).unwrap();
    let err = pipeline
        .synchronize(&repository.event("/objects/123", Operation::Update))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Delete { status: Some(404), .. }));
    assert_eq!(store.triple_count().unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_runs_for_different_identifiers() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    for i in 0..8 {
        repository.put(&format!("/objects/{}", i), "text/turtle", &turtle_document(&i.to_string()));
    }
    let pipeline = Arc::new(pipeline_for(&store, RdfFormat::Turtle));

    let mut handles = Vec::new();
    for i in 0..8 {
        let pipeline = Arc::clone(&pipeline);
        let event = repository.event(&format!("/objects/{}", i), Operation::Create);
        handles.push(tokio::spawn(async move { pipeline.synchronize(&event).await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().triples_changed, Some(1));
    }

    assert_eq!(store.triple_count().unwrap(), 8);
}

#[tokio::test]
async fn test_blank_nodes_do_not_accumulate_or_survive_delete() {
    let repository = RepositoryFixture::start().await;
    let store = EmbeddedTriplestore::start("/test").await.unwrap();
    let with_blank = "@prefix dc: <http://purl.org/dc/elements/1.1/> .\n\
                      <> dc:title \"Test\" ; dc:creator [ dc:title \"Alice\" ] .\n";
    repository.put("/objects/123", "text/turtle", with_blank);

    let pipeline = pipeline_for(&store, RdfFormat::Turtle);
    let update = repository.event("/objects/123", Operation::Update);

    let result = pipeline.synchronize(&update).await.unwrap();
    assert_eq!(result.triples_changed, Some(3));
    let after_first = store.triple_count().unwrap();
    assert_eq!(after_first, 3);

    pipeline.synchronize(&update).await.unwrap();
    assert_eq!(store.triple_count().unwrap(), after_first);

    let creator = format!("{}#genid-0", repository.subject_uri("/objects/123"));
    assert_eq!(titles(store.store(), &creator), vec!["Alice"]);

    pipeline.synchronize(&repository.event("/objects/123", Operation::Delete)).await.unwrap();
    assert_eq!(store.triple_count().unwrap(), 0);
}
