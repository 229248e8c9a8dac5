//! Open Library lookup against a mock HTTP server.

mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{event, MemoryStore, RecordingUi, ADA};
use escs_core::{MetadataSource, SelectMode, SelectionContext};
use escs_scan::{
    CheckoutEngine, LookupSettings, MetadataLookup, MetadataResolver, OpenLibraryLookup,
    ScanError, ScanOutcome,
};

const DUNE: &str = "9780441013593";

async fn mount_books(server: &MockServer, code: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .and(query_param("bibkeys", format!("ISBN:{}", code)))
        .and(query_param("format", "json"))
        .and(query_param("jscmd", "data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_lookup_extracts_title_author_cover() {
    let server = MockServer::start().await;
    mount_books(
        &server,
        DUNE,
        json!({
            "ISBN:9780441013593": {
                "title": "Dune",
                "authors": [{"name": "Frank Herbert"}, {"name": "Someone Else"}],
                "cover": {"small": "s.jpg", "medium": "https://covers.example/m.jpg"}
            }
        }),
    )
    .await;

    let lookup = OpenLibraryLookup::new(server.uri()).unwrap();
    let result = lookup
        .lookup(DUNE, Duration::from_secs(5))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.title.as_deref(), Some("Dune"));
    assert_eq!(result.author.as_deref(), Some("Frank Herbert"));
    assert_eq!(
        result.cover.as_deref(),
        Some("https://covers.example/m.jpg")
    );
}

#[tokio::test]
async fn test_unknown_isbn_is_none() {
    let server = MockServer::start().await;
    mount_books(&server, "0000000000", json!({})).await;

    let lookup = OpenLibraryLookup::new(server.uri()).unwrap();
    let result = lookup
        .lookup("0000000000", Duration::from_secs(5))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_missing_fields_are_none() {
    let server = MockServer::start().await;
    mount_books(&server, DUNE, json!({ "ISBN:9780441013593": { "title": "Dune" } })).await;

    let lookup = OpenLibraryLookup::new(server.uri()).unwrap();
    let result = lookup
        .lookup(DUNE, Duration::from_secs(5))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.title.as_deref(), Some("Dune"));
    assert!(result.author.is_none());
    assert!(result.cover.is_none());
}

#[tokio::test]
async fn test_server_error_is_lookup_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let lookup = OpenLibraryLookup::new(server.uri()).unwrap();
    let err = lookup
        .lookup(DUNE, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::LookupFailed(_)));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let lookup = OpenLibraryLookup::new(server.uri()).unwrap();
    let err = lookup
        .lookup(DUNE, Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::LookupTimeout));
}

#[tokio::test]
async fn test_checkout_uses_open_library_metadata() {
    let server = MockServer::start().await;
    mount_books(
        &server,
        DUNE,
        json!({ "ISBN:9780441013593": { "title": "Dune", "authors": [{"name": "Frank Herbert"}] } }),
    )
    .await;

    let settings = LookupSettings {
        base_url: server.uri(),
        ..Default::default()
    };
    let lookup = OpenLibraryLookup::from_settings(&settings)
        .unwrap()
        .map(|l| Arc::new(l) as Arc<dyn MetadataLookup>);

    let store = Arc::new(MemoryStore::new());
    let ui = Arc::new(RecordingUi::default());
    let resolver = MetadataResolver::standard(store.clone(), lookup, settings.timeout());
    let engine = CheckoutEngine::new(store.clone(), resolver, ui);

    let mut selection = SelectionContext::new();
    selection.select(ADA, SelectMode::Replace);

    match engine.process(&mut selection, &event(DUNE)).await.unwrap() {
        ScanOutcome::CheckedOut { book, source, .. } => {
            assert_eq!(source, MetadataSource::External);
            assert_eq!(book.title, "Dune");
            assert_eq!(book.author, "Frank Herbert");
        }
        other => panic!("expected checkout, got {:?}", other),
    }
    assert_eq!(store.student(ADA).books[0].title, "Dune");
}
