//! # Error Types
//!
//! Domain-specific error types for escs-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  escs-core errors (this file)                                          │
//! │  ├── CoreError        - Scan decision rule violations                  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  escs-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  escs-scan errors (engine crate)                                       │
//! │  └── ScanError        - What the station reports to the user           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ScanError → notification          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Scan decision rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A book scan needs exactly one selected student.
    ///
    /// ## When This Occurs
    /// - Nobody is selected yet
    /// - Several students are selected (bulk actions in the UI)
    ///
    /// ## User Workflow
    /// ```text
    /// Scan "9780140449136"
    ///      │
    ///      ▼
    /// selection.count() == 2
    ///      │
    ///      ▼
    /// AmbiguousSelection { selected: 2 }
    ///      │
    ///      ▼
    /// UI shows: "Select a student first"
    /// ```
    #[error("Select a student first ({selected} selected)")]
    AmbiguousSelection { selected: usize },

    /// The selected student no longer exists in storage.
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., whitespace in a code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
