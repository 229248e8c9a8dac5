//! # History Recorder
//!
//! Builds check-in records and reads them back. Appending happens in the
//! store, inside the same commit as the shortened book list.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::ScanResult;
use crate::store::LibraryStore;
use escs_core::{history, Book, HistoryRecord};

#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn LibraryStore>,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        HistoryRecorder { store }
    }

    /// Record for one returned book. Called once per check-in.
    pub fn record(
        &self,
        student_id: &str,
        student_name: &str,
        book: Book,
        occurred_at: DateTime<Utc>,
    ) -> HistoryRecord {
        history::record(student_id, student_name, book, occurred_at)
    }

    /// A student's history, newest first.
    pub async fn history(&self, student_id: &str) -> ScanResult<Vec<HistoryRecord>> {
        let mut records = self.store.history(student_id).await?;
        history::sort_newest_first(&mut records);
        Ok(records)
    }
}
