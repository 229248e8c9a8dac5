//! # Library Store
//!
//! The persistence seam of the scan engine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutEngine ──► dyn LibraryStore ──┬──► escs_db::Database (SQLite)  │
//! │                                        └──► in-memory fakes (tests)     │
//! │                                                                         │
//! │  update_books() is the only write. It replaces one student's book list │
//! │  and, for a check-in, appends the history record in the same commit.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ScanError, ScanResult};
use escs_core::{Book, BookChange, CatalogEntry, HistoryRecord, Student};
use escs_db::Database;

/// Persistence collaborator used by the engine.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// All students with their current books.
    async fn students(&self) -> ScanResult<Vec<Student>>;

    /// Commits `books` as the student's complete list.
    ///
    /// For [`BookChange::Checkin`] the carried record is appended atomically
    /// with the new list. Returns the authoritative student list after the
    /// commit.
    async fn update_books(
        &self,
        student_id: &str,
        books: Vec<Book>,
        change: BookChange,
    ) -> ScanResult<Vec<Student>>;

    async fn catalog(&self) -> ScanResult<Vec<CatalogEntry>>;

    async fn legacy_catalog(&self) -> ScanResult<Vec<CatalogEntry>>;

    /// History for one student, newest first.
    async fn history(&self, student_id: &str) -> ScanResult<Vec<HistoryRecord>>;

    /// Exact-match lookup in the curated catalog.
    async fn find_in_catalog(&self, code: &str) -> ScanResult<Option<CatalogEntry>> {
        Ok(self.catalog().await?.into_iter().find(|e| e.code == code))
    }

    /// Exact-match lookup in the legacy catalog.
    async fn find_in_legacy_catalog(&self, code: &str) -> ScanResult<Option<CatalogEntry>> {
        Ok(self
            .legacy_catalog()
            .await?
            .into_iter()
            .find(|e| e.code == code))
    }
}

// =============================================================================
// SQLite Implementation
// =============================================================================

// Inherent repository accessors on `Database` shadow the trait methods of the
// same name, so the bodies below reach the repositories directly.
#[async_trait]
impl LibraryStore for Database {
    async fn students(&self) -> ScanResult<Vec<Student>> {
        self.students()
            .list()
            .await
            .map_err(ScanError::store_unavailable)
    }

    async fn update_books(
        &self,
        student_id: &str,
        books: Vec<Book>,
        change: BookChange,
    ) -> ScanResult<Vec<Student>> {
        let record = match &change {
            BookChange::Checkin { record } => Some(record),
            BookChange::Checkout { .. } => None,
        };

        self.students()
            .replace_books(student_id, &books, record)
            .await
            .map_err(ScanError::persistence)?;

        debug!(student_id = %student_id, change = change.label(), code = %change.code(), "Book list committed");

        self.students()
            .list()
            .await
            .map_err(ScanError::store_unavailable)
    }

    async fn catalog(&self) -> ScanResult<Vec<CatalogEntry>> {
        self.catalog()
            .list()
            .await
            .map_err(ScanError::store_unavailable)
    }

    async fn legacy_catalog(&self) -> ScanResult<Vec<CatalogEntry>> {
        self.catalog()
            .list_legacy()
            .await
            .map_err(ScanError::store_unavailable)
    }

    async fn history(&self, student_id: &str) -> ScanResult<Vec<HistoryRecord>> {
        self.history()
            .list_for_student(student_id)
            .await
            .map_err(ScanError::store_unavailable)
    }

    async fn find_in_catalog(&self, code: &str) -> ScanResult<Option<CatalogEntry>> {
        self.catalog()
            .find(code)
            .await
            .map_err(ScanError::store_unavailable)
    }

    async fn find_in_legacy_catalog(&self, code: &str) -> ScanResult<Option<CatalogEntry>> {
        self.catalog()
            .find_legacy(code)
            .await
            .map_err(ScanError::store_unavailable)
    }
}
