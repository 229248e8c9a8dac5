//! # Scan UI
//!
//! Everything the engine shows to or asks of the user goes through
//! [`ScanUi`]. The terminal station, a desktop shell and the test fakes each
//! provide their own implementation.

use async_trait::async_trait;

use escs_core::{SelectionContext, Student};

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// UI collaborator for the scan engine.
#[async_trait]
pub trait ScanUi: Send + Sync {
    /// Asks a yes/no question. Resolves once the user answers.
    async fn confirm(&self, title: &str, message: &str) -> bool;

    /// Shows a transient message.
    fn notify(&self, message: &str, severity: Severity);

    /// The selected student set changed.
    fn selection_changed(&self, selection: &SelectionContext);

    /// Redraws the student list from authoritative data.
    fn render(&self, students: &[Student], selection: &SelectionContext);

    /// A check-out fell back to placeholder metadata; the UI may offer to
    /// add `code` to the catalog.
    fn offer_catalog_entry(&self, _code: &str) {}
}

/// No-op UI for headless use. Declines every confirmation.
pub struct NoOpUi;

#[async_trait]
impl ScanUi for NoOpUi {
    async fn confirm(&self, _title: &str, _message: &str) -> bool {
        false
    }

    fn notify(&self, _message: &str, _severity: Severity) {}

    fn selection_changed(&self, _selection: &SelectionContext) {}

    fn render(&self, _students: &[Student], _selection: &SelectionContext) {}
}
