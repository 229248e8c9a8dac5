//! The engine running on the SQLite store.

mod common;

use chrono::Utc;
use std::sync::Arc;

use common::{event, RecordingUi};
use escs_core::{Book, BookChange, BookMetadata, CatalogEntry, MetadataSource, SelectionContext};
use escs_db::{Database, DbConfig};
use escs_scan::{CheckoutEngine, LibraryStore, MetadataResolver, ScanError, ScanOutcome};

const DUNE: &str = "9780441013593";
const HOBBIT: &str = "9780547928227";

async fn database() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn entry(code: &str, title: &str) -> CatalogEntry {
    CatalogEntry {
        code: code.to_string(),
        title: title.to_string(),
        author: "Author".to_string(),
        cover: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_scan_session_on_sqlite() {
    let db = database().await;
    let ada = db.students().add("Ada Lovelace").await.unwrap();
    db.catalog().save(&entry(DUNE, "Dune")).await.unwrap();
    db.catalog()
        .save_legacy(&entry(HOBBIT, "The Hobbit"))
        .await
        .unwrap();

    let store: Arc<dyn LibraryStore> = Arc::new(db.clone());
    let ui = Arc::new(RecordingUi::agreeing());
    let resolver = MetadataResolver::standard(store.clone(), None, Default::default());
    let engine = CheckoutEngine::new(store.clone(), resolver, ui.clone());
    let mut selection = SelectionContext::new();

    let outcome = engine.process(&mut selection, &event(&ada.id)).await.unwrap();
    assert!(matches!(outcome, ScanOutcome::StudentSelected { .. }));

    match engine.process(&mut selection, &event(DUNE)).await.unwrap() {
        ScanOutcome::CheckedOut { source, .. } => assert_eq!(source, MetadataSource::Catalog),
        other => panic!("expected checkout, got {:?}", other),
    }
    match engine.process(&mut selection, &event(HOBBIT)).await.unwrap() {
        ScanOutcome::CheckedOut { source, .. } => {
            assert_eq!(source, MetadataSource::LegacyCatalog)
        }
        other => panic!("expected checkout, got {:?}", other),
    }

    let stored = db.students().get(&ada.id).await.unwrap().unwrap();
    let titles: Vec<_> = stored.books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune", "The Hobbit"]);

    let outcome = engine.process(&mut selection, &event(DUNE)).await.unwrap();
    assert!(matches!(outcome, ScanOutcome::CheckedIn { .. }));

    let stored = db.students().get(&ada.id).await.unwrap().unwrap();
    assert_eq!(stored.books.len(), 1);
    assert_eq!(stored.books[0].code, HOBBIT);

    let history = store.history(&ada.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].book.code, DUNE);
    assert_eq!(history[0].student_name, "Ada Lovelace");
    assert!(history[0].book.checkin_date.is_some());
}

#[tokio::test]
async fn test_update_books_for_missing_student_is_persistence_error() {
    let db = database().await;
    let store: Arc<dyn LibraryStore> = Arc::new(db);

    let book = Book::checkout("111", BookMetadata::placeholder(), Utc::now());
    let err = store
        .update_books("12345678", vec![book.clone()], BookChange::Checkout { book })
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::Persistence(_)));
    assert!(err.to_string().starts_with("Could not save changes"));
}

#[tokio::test]
async fn test_update_books_returns_authoritative_list() {
    let db = database().await;
    let ada = db.students().add("Ada Lovelace").await.unwrap();
    db.students().add("Alan Turing").await.unwrap();
    let store: Arc<dyn LibraryStore> = Arc::new(db);

    let book = Book::checkout("111", BookMetadata::placeholder(), Utc::now());
    let students = store
        .update_books(&ada.id, vec![book.clone()], BookChange::Checkout { book })
        .await
        .unwrap();

    assert_eq!(students.len(), 2);
    let ada = students.iter().find(|s| s.id == ada.id).unwrap();
    assert_eq!(ada.books.len(), 1);
}

#[tokio::test]
async fn test_catalog_lookups() {
    let db = database().await;
    db.catalog().save(&entry(DUNE, "Dune")).await.unwrap();
    db.catalog()
        .save_legacy(&entry(HOBBIT, "The Hobbit"))
        .await
        .unwrap();
    let store: Arc<dyn LibraryStore> = Arc::new(db);

    assert_eq!(store.catalog().await.unwrap().len(), 1);
    assert_eq!(store.legacy_catalog().await.unwrap().len(), 1);
    assert!(store.find_in_catalog(DUNE).await.unwrap().is_some());
    assert!(store.find_in_catalog(HOBBIT).await.unwrap().is_none());
    assert_eq!(
        store
            .find_in_legacy_catalog(HOBBIT)
            .await
            .unwrap()
            .unwrap()
            .title,
        "The Hobbit"
    );
}
