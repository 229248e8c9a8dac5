//! # Validation
//!
//! Input validation for scanned codes, student names and catalog entries.
//!
//! ```text
//!   raw input ──► validate_*() ──► Ok(())            proceed
//!                              └──► ValidationError   shown to the user
//! ```

use crate::error::ValidationError;
use crate::types::CatalogEntry;

// =============================================================================
// Constants
// =============================================================================

pub const STUDENT_NAME_MIN: usize = 2;
pub const STUDENT_NAME_MAX: usize = 100;

/// Longest code a scanner is expected to produce.
pub const SCAN_CODE_MAX: usize = 64;

pub const TITLE_MAX: usize = 300;

// =============================================================================
// Validators
// =============================================================================

/// A scan code must be non-empty, bounded and free of whitespace.
pub fn validate_scan_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }
    if code.chars().count() > SCAN_CODE_MAX {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: SCAN_CODE_MAX,
        });
    }
    if code.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }
    Ok(())
}

/// Student names are trimmed and must be 2..=100 characters.
pub fn validate_student_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    let len = name.chars().count();
    if len < STUDENT_NAME_MIN {
        return Err(ValidationError::TooShort {
            field: "name".to_string(),
            min: STUDENT_NAME_MIN,
        });
    }
    if len > STUDENT_NAME_MAX {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: STUDENT_NAME_MAX,
        });
    }
    Ok(())
}

/// A catalog entry needs a valid code and a title.
pub fn validate_catalog_entry(entry: &CatalogEntry) -> Result<(), ValidationError> {
    validate_scan_code(&entry.code)?;

    if entry.title.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }
    if entry.title.chars().count() > TITLE_MAX {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: TITLE_MAX,
        });
    }
    Ok(())
}
