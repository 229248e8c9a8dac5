//! # Render Sync
//!
//! Brings the UI back in line with storage after a commit.
//!
//! ```text
//! commit ──► authoritative students ──► prune selection ──► reassert
//!                                                            active student
//!                                                               │
//!                                                               ▼
//!                                                  ScanUi::render(students)
//! ```
//!
//! The UI is only ever drawn from what the store returned. Nothing is patched
//! locally.

use std::sync::Arc;
use tracing::debug;

use crate::error::ScanResult;
use crate::store::LibraryStore;
use crate::ui::ScanUi;
use escs_core::{SelectMode, SelectionContext, Student};

#[derive(Clone)]
pub struct RenderSync {
    store: Arc<dyn LibraryStore>,
    ui: Arc<dyn ScanUi>,
}

impl RenderSync {
    pub fn new(store: Arc<dyn LibraryStore>, ui: Arc<dyn ScanUi>) -> Self {
        RenderSync { store, ui }
    }

    /// Fetches the student list and renders it.
    pub async fn refresh(&self, selection: &mut SelectionContext) -> ScanResult<Vec<Student>> {
        let students = self.store.students().await?;
        self.apply(selection, &students);
        Ok(students)
    }

    /// Renders an already fetched authoritative list.
    pub fn apply(&self, selection: &mut SelectionContext, students: &[Student]) {
        let active = selection.single_selected().map(str::to_owned);

        let dropped = selection.retain_existing(students.iter().map(|s| s.id.as_str()));

        if let Some(id) = active {
            if students.iter().any(|s| s.id == id) {
                selection.select(id, SelectMode::Replace);
            }
        }

        if dropped > 0 {
            debug!(dropped, "Pruned vanished students from selection");
            self.ui.selection_changed(selection);
        }

        self.ui.render(students, selection);
    }
}
