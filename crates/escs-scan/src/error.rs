//! # Scan Error Types
//!
//! Error types for the scan engine.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Scan Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Decision      │  │    Storage      │  │     Lookup              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core(...)      │  │  StoreUnavail.  │  │  LookupTimeout          │ │
//! │  │  ambiguous sel. │  │  Persistence    │  │  LookupFailed           │ │
//! │  │  student gone   │  │                 │  │  (recovered: Unknown)   │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │  Configuration  │  │    Internal     │                              │
//! │  │                 │  │                 │                              │
//! │  │  InvalidConfig  │  │  Internal       │                              │
//! │  │  ConfigLoad/Save│  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use escs_core::CoreError;
use escs_db::DbError;
use thiserror::Error;

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Debug, Error)]
pub enum ScanError {
    // =========================================================================
    // Decision Errors
    // =========================================================================
    /// A decision rule rejected the scan.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Reading students, catalog or history failed.
    #[error("Could not load library data: {0}")]
    StoreUnavailable(String),

    /// Committing a book list failed. Nothing was applied.
    ///
    /// ## When This Occurs
    /// - The database rejected the write (constraint, disk full)
    /// - The student was removed between read and commit
    #[error("Could not save changes: {0}")]
    Persistence(String),

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// External lookup did not answer in time.
    #[error("Book lookup timed out")]
    LookupTimeout,

    /// External lookup failed (network, HTTP status, bad body).
    #[error("Book lookup failed: {0}")]
    LookupFailed(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid scanner configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// Wraps a failed read.
    pub fn store_unavailable(err: DbError) -> Self {
        ScanError::StoreUnavailable(err.to_string())
    }

    /// Wraps a failed commit.
    pub fn persistence(err: DbError) -> Self {
        ScanError::Persistence(err.to_string())
    }

    /// True if the failure came from the metadata lookup.
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, ScanError::LookupTimeout | ScanError::LookupFailed(_))
    }

    /// True if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidConfig(_)
                | ScanError::ConfigLoadFailed(_)
                | ScanError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScanError::LookupTimeout
        } else {
            ScanError::LookupFailed(err.to_string())
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        ScanError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ScanError {
    fn from(err: toml::ser::Error) -> Self {
        ScanError::ConfigSaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::persistence(DbError::not_found("Student", "12345678"));
        assert_eq!(
            err.to_string(),
            "Could not save changes: Student not found: 12345678"
        );

        let err: ScanError = CoreError::AmbiguousSelection { selected: 2 }.into();
        assert_eq!(err.to_string(), "Select a student first (2 selected)");
    }

    #[test]
    fn test_categories() {
        assert!(ScanError::LookupTimeout.is_lookup_error());
        assert!(ScanError::LookupFailed("503".into()).is_lookup_error());
        assert!(!ScanError::Persistence("x".into()).is_lookup_error());

        assert!(ScanError::InvalidConfig("x".into()).is_config_error());
        assert!(!ScanError::Internal("x".into()).is_config_error());
    }
}
