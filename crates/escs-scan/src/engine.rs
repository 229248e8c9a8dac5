//! # Checkout Engine
//!
//! Decides what a completed scan means and carries it out.
//!
//! ## Decision Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Scan Decision Flow                              │
//! │                                                                         │
//! │  code ──► matches a student id? ──yes──► select that student (only)    │
//! │                │ no                                                     │
//! │                ▼                                                        │
//! │         exactly one selected? ──no──► "Select a student first"         │
//! │                │ yes                                                    │
//! │                ▼                                                        │
//! │         student has the code?                                           │
//! │           │ yes                          │ no                           │
//! │           ▼                              ▼                              │
//! │     confirm check-in              resolve metadata                      │
//! │       │ yes       │ no            (catalog → legacy → external →        │
//! │       ▼           ▼                placeholder)                         │
//! │   remove book,  nothing                 │                               │
//! │   append record                         ▼                               │
//! │   (one commit)                    append book (one commit)              │
//! │       │                                 │                               │
//! │       └──────────────┬──────────────────┘                               │
//! │                      ▼                                                  │
//! │          refetch + render, then notify                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Student ids take precedence over book codes. A book whose code collides
//! with a student id can never be checked out by scanning.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{ScanError, ScanResult};
use crate::recorder::HistoryRecorder;
use crate::render::RenderSync;
use crate::resolver::MetadataResolver;
use crate::store::LibraryStore;
use crate::ui::{ScanUi, Severity};
use escs_core::validation::validate_scan_code;
use escs_core::{
    Book, BookChange, Clock, CoreError, HistoryRecord, MetadataSource, ScanEvent, SelectMode,
    SelectionContext, Student, SystemClock,
};

// =============================================================================
// User-Facing Messages
// =============================================================================

pub const MSG_SELECT_STUDENT_FIRST: &str = "Select a student first";
pub const MSG_FETCHING: &str = "Fetching book info...";
pub const MSG_STUDENT_GONE: &str = "Student not found. Please select a student again.";
pub const MSG_GENERIC_FAILURE: &str = "Error processing scan. Please try again.";
pub const CONFIRM_CHECKIN_TITLE: &str = "Check In Book";

/// What a processed scan did.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    StudentSelected {
        student_id: String,
        name: String,
    },
    CheckedOut {
        student_id: String,
        book: Book,
        source: MetadataSource,
    },
    CheckedIn {
        record: HistoryRecord,
    },
    /// The user answered "no" to the check-in prompt. Nothing changed.
    CheckinDeclined {
        student_id: String,
        code: String,
    },
}

// =============================================================================
// Checkout Engine
// =============================================================================

/// Scan decision logic. Cheap to clone; clones share every collaborator.
#[derive(Clone)]
pub struct CheckoutEngine {
    store: Arc<dyn LibraryStore>,
    resolver: Arc<MetadataResolver>,
    recorder: HistoryRecorder,
    render: RenderSync,
    ui: Arc<dyn ScanUi>,
    clock: Arc<dyn Clock>,
}

impl CheckoutEngine {
    pub fn new(
        store: Arc<dyn LibraryStore>,
        resolver: MetadataResolver,
        ui: Arc<dyn ScanUi>,
    ) -> Self {
        CheckoutEngine {
            recorder: HistoryRecorder::new(store.clone()),
            render: RenderSync::new(store.clone(), ui.clone()),
            store,
            resolver: Arc::new(resolver),
            ui,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for timestamps and debouncing.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn store(&self) -> &Arc<dyn LibraryStore> {
        &self.store
    }

    pub fn recorder(&self) -> &HistoryRecorder {
        &self.recorder
    }

    pub fn render(&self) -> &RenderSync {
        &self.render
    }

    pub fn ui(&self) -> &Arc<dyn ScanUi> {
        &self.ui
    }

    /// Processes a scan and reports failures to the user.
    ///
    /// Never fails: every error is logged, turned into a notification and
    /// yields `None`.
    pub async fn handle(
        &self,
        selection: &mut SelectionContext,
        event: &ScanEvent,
    ) -> Option<ScanOutcome> {
        match self.process(selection, event).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                self.report(&event.code, &err);
                None
            }
        }
    }

    /// Processes a scan. Failures are returned, not shown.
    pub async fn process(
        &self,
        selection: &mut SelectionContext,
        event: &ScanEvent,
    ) -> ScanResult<ScanOutcome> {
        let code = event.code.as_str();
        validate_scan_code(code).map_err(CoreError::from)?;

        let students = self.store.students().await?;

        if let Some(student) = students.iter().find(|s| s.id == code) {
            selection.select(student.id.clone(), SelectMode::Replace);
            self.ui.selection_changed(selection);
            self.ui
                .notify(&format!("✓ Selected: {}", student.name), Severity::Success);

            info!(student_id = %student.id, "Student selected by scan");
            return Ok(ScanOutcome::StudentSelected {
                student_id: student.id.clone(),
                name: student.name.clone(),
            });
        }

        let selected_id = match selection.single_selected() {
            Some(id) => id.to_owned(),
            None => {
                return Err(CoreError::AmbiguousSelection {
                    selected: selection.count(),
                }
                .into())
            }
        };

        let student = match students.into_iter().find(|s| s.id == selected_id) {
            Some(student) => student,
            None => {
                selection.deselect(&selected_id);
                self.ui.selection_changed(selection);
                return Err(CoreError::StudentNotFound(selected_id).into());
            }
        };

        if student.has_book(code) {
            self.check_in(selection, student, code).await
        } else {
            self.check_out(selection, student, code).await
        }
    }

    async fn check_in(
        &self,
        selection: &mut SelectionContext,
        student: Student,
        code: &str,
    ) -> ScanResult<ScanOutcome> {
        let (remaining, returned) = student.without_book(code);
        let book = returned.ok_or_else(|| {
            ScanError::Internal(format!("book {} vanished from {}", code, student.id))
        })?;

        let message = format!(
            "Check in: {}?\nStudent: {}",
            book.display_title(),
            student.name
        );
        if !self.ui.confirm(CONFIRM_CHECKIN_TITLE, &message).await {
            debug!(student_id = %student.id, code = %code, "Check-in declined");
            return Ok(ScanOutcome::CheckinDeclined {
                student_id: student.id,
                code: code.to_string(),
            });
        }

        let now = self.clock.utc_now();
        let record = self.recorder.record(&student.id, &student.name, book, now);

        let students = self
            .store
            .update_books(
                &student.id,
                remaining,
                BookChange::Checkin {
                    record: record.clone(),
                },
            )
            .await?;

        self.render.apply(selection, &students);
        self.ui.notify(
            &format!("✓ Checked in: {}", record.book.display_title()),
            Severity::Success,
        );

        info!(student_id = %student.id, code = %code, record_id = %record.id, "Book checked in");
        Ok(ScanOutcome::CheckedIn { record })
    }

    async fn check_out(
        &self,
        selection: &mut SelectionContext,
        student: Student,
        code: &str,
    ) -> ScanResult<ScanOutcome> {
        self.ui.notify(MSG_FETCHING, Severity::Info);

        let resolved = self.resolver.resolve(code).await;
        let book = Book::checkout(code, resolved.metadata.clone(), self.clock.utc_now());

        let mut books = student.books;
        books.push(book.clone());

        let students = self
            .store
            .update_books(
                &student.id,
                books,
                BookChange::Checkout { book: book.clone() },
            )
            .await?;

        self.render.apply(selection, &students);
        self.ui.notify(
            &format!("✓ Checked out: {}", book.display_title()),
            Severity::Success,
        );

        if resolved.is_placeholder() {
            self.ui.offer_catalog_entry(code);
        }

        info!(
            student_id = %student.id,
            code = %code,
            source = %resolved.source,
            "Book checked out"
        );
        Ok(ScanOutcome::CheckedOut {
            student_id: student.id,
            book,
            source: resolved.source,
        })
    }

    fn report(&self, code: &str, err: &ScanError) {
        match err {
            ScanError::Core(CoreError::AmbiguousSelection { selected }) => {
                info!(code = %code, selected, "Book scan without a single selected student");
                self.ui.notify(MSG_SELECT_STUDENT_FIRST, Severity::Error);
            }
            ScanError::Core(CoreError::StudentNotFound(id)) => {
                warn!(code = %code, student_id = %id, "Selected student no longer exists");
                self.ui.notify(MSG_STUDENT_GONE, Severity::Error);
            }
            ScanError::Core(CoreError::Validation(e)) => {
                warn!(code = %code, error = %e, "Rejected malformed scan");
                self.ui.notify(&format!("Invalid scan: {}", e), Severity::Error);
            }
            ScanError::Persistence(_) => {
                warn!(code = %code, error = %err, "Commit failed");
                self.ui.notify(&err.to_string(), Severity::Error);
            }
            other => {
                error!(code = %code, error = %other, "Scan processing failed");
                self.ui.notify(MSG_GENERIC_FAILURE, Severity::Error);
            }
        }
    }
}
