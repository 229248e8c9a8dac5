//! Shared fakes for the escs-scan integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Notify};

use escs_core::{
    Book, BookChange, CatalogEntry, HistoryRecord, ScanEvent, SelectionContext, Student,
};
use escs_scan::{
    CheckoutEngine, KeyInput, LibraryStore, LookupResult, MetadataLookup, MetadataResolver,
    ScanError, ScanResult, ScanUi, Severity,
};

pub const ADA: &str = "12345678";
pub const ALAN: &str = "87654321";

// =============================================================================
// Store
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    students: Mutex<Vec<Student>>,
    catalog: Mutex<Vec<CatalogEntry>>,
    legacy: Mutex<Vec<CatalogEntry>>,
    history: Mutex<Vec<HistoryRecord>>,
    commits: AtomicUsize,
    fail_commits: AtomicBool,
    commit_gate: Option<Arc<Notify>>,
}

impl MemoryStore {
    /// Ada and Alan, no books.
    pub fn new() -> Self {
        let store = MemoryStore::default();
        store.add_student(ADA, "Ada Lovelace");
        store.add_student(ALAN, "Alan Turing");
        store
    }

    /// Like `new`, but every commit waits for `gate` to be notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        let store = MemoryStore {
            commit_gate: Some(gate),
            ..Default::default()
        };
        store.add_student(ADA, "Ada Lovelace");
        store.add_student(ALAN, "Alan Turing");
        store
    }

    pub fn add_student(&self, id: &str, name: &str) {
        self.students.lock().unwrap().push(Student {
            id: id.to_string(),
            name: name.to_string(),
            books: Vec::new(),
            created_at: Utc::now(),
        });
    }

    pub fn add_catalog(&self, code: &str, title: &str) {
        self.catalog.lock().unwrap().push(entry(code, title));
    }

    pub fn add_legacy(&self, code: &str, title: &str) {
        self.legacy.lock().unwrap().push(entry(code, title));
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn student(&self, id: &str) -> Student {
        self.students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .unwrap()
    }

    pub fn all_history(&self) -> Vec<HistoryRecord> {
        self.history.lock().unwrap().clone()
    }
}

fn entry(code: &str, title: &str) -> CatalogEntry {
    CatalogEntry {
        code: code.to_string(),
        title: title.to_string(),
        author: "Catalog Author".to_string(),
        cover: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn students(&self) -> ScanResult<Vec<Student>> {
        Ok(self.students.lock().unwrap().clone())
    }

    async fn update_books(
        &self,
        student_id: &str,
        books: Vec<Book>,
        change: BookChange,
    ) -> ScanResult<Vec<Student>> {
        if let Some(gate) = &self.commit_gate {
            gate.notified().await;
        }

        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(ScanError::Persistence("disk full".into()));
        }

        let mut students = self.students.lock().unwrap();
        let student = students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or_else(|| ScanError::Persistence(format!("Student not found: {}", student_id)))?;
        student.books = books;

        if let BookChange::Checkin { record } = change {
            self.history.lock().unwrap().push(record);
        }

        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(students.clone())
    }

    async fn catalog(&self) -> ScanResult<Vec<CatalogEntry>> {
        Ok(self.catalog.lock().unwrap().clone())
    }

    async fn legacy_catalog(&self) -> ScanResult<Vec<CatalogEntry>> {
        Ok(self.legacy.lock().unwrap().clone())
    }

    async fn history(&self, student_id: &str) -> ScanResult<Vec<HistoryRecord>> {
        let mut records: Vec<_> = self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        records.reverse();
        Ok(records)
    }
}

// =============================================================================
// UI
// =============================================================================

#[derive(Default)]
pub struct RecordingUi {
    notifications: Mutex<Vec<(String, Severity)>>,
    confirms: Mutex<Vec<(String, String)>>,
    offers: Mutex<Vec<String>>,
    answer: AtomicBool,
    renders: AtomicUsize,
    selection_changes: AtomicUsize,
}

impl RecordingUi {
    /// Answers "yes" to every confirmation.
    pub fn agreeing() -> Self {
        let ui = RecordingUi::default();
        ui.answer(true);
        ui
    }

    pub fn answer(&self, yes: bool) {
        self.answer.store(yes, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn last_message(&self) -> Option<(String, Severity)> {
        self.notifications.lock().unwrap().last().cloned()
    }

    pub fn confirms(&self) -> Vec<(String, String)> {
        self.confirms.lock().unwrap().clone()
    }

    pub fn offers(&self) -> Vec<String> {
        self.offers.lock().unwrap().clone()
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn selection_change_count(&self) -> usize {
        self.selection_changes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScanUi for RecordingUi {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        self.confirms
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        self.answer.load(Ordering::SeqCst)
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.notifications
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }

    fn selection_changed(&self, _selection: &SelectionContext) {
        self.selection_changes.fetch_add(1, Ordering::SeqCst);
    }

    fn render(&self, _students: &[Student], _selection: &SelectionContext) {
        self.renders.fetch_add(1, Ordering::SeqCst);
    }

    fn offer_catalog_entry(&self, code: &str) {
        self.offers.lock().unwrap().push(code.to_string());
    }
}

// =============================================================================
// Lookup
// =============================================================================

#[derive(Default)]
pub struct FakeLookup {
    results: HashMap<String, LookupResult>,
    delay: Option<Duration>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, code: &str, title: &str, author: &str) -> Self {
        self.results.insert(
            code.to_string(),
            LookupResult {
                title: Some(title.to_string()),
                author: Some(author.to_string()),
                cover: None,
            },
        );
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataLookup for FakeLookup {
    async fn lookup(&self, code: &str, _timeout: Duration) -> ScanResult<Option<LookupResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ScanError::LookupFailed("HTTP 503".into()));
        }
        Ok(self.results.get(code).cloned())
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn event(code: &str) -> ScanEvent {
    ScanEvent {
        code: code.to_string(),
        received_at: Instant::now(),
    }
}

/// Engine over the standard chain with a 5 s lookup timeout.
pub fn engine(
    store: Arc<MemoryStore>,
    lookup: Option<Arc<FakeLookup>>,
    ui: Arc<RecordingUi>,
) -> CheckoutEngine {
    let lookup = lookup.map(|l| l as Arc<dyn MetadataLookup>);
    let resolver = MetadataResolver::standard(store.clone(), lookup, Duration::from_secs(5));
    CheckoutEngine::new(store, resolver, ui)
}

pub async fn type_code(keys: &mpsc::Sender<KeyInput>, code: &str) {
    for c in code.chars() {
        keys.send(KeyInput::Char(c)).await.unwrap();
    }
    keys.send(KeyInput::Submit).await.unwrap();
}
