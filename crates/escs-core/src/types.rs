//! # Domain Types
//!
//! Core domain types used throughout the checkout station.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Student      │   │      Book       │   │  HistoryRecord  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (8 digits)  │──►│  code (ISBN)    │   │  id (UUID)      │       │
//! │  │  name           │   │  title, author  │   │  student_id     │       │
//! │  │  books[]        │   │  checkout_date  │   │  book snapshot  │       │
//! │  └─────────────────┘   └─────────────────┘   │  occurred_at    │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogEntry   │   │  BookMetadata   │   │   BookChange    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code → title,  │   │  title, author  │   │  Checkout{book} │       │
//! │  │  author, cover  │   │  cover          │   │  Checkin{record}│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The student id doubles as the barcode printed on the student card, which is
//! how a scan can address either a student or a book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{UNKNOWN_AUTHOR, UNKNOWN_TITLE};

// =============================================================================
// Student
// =============================================================================

/// A borrower. Owned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Student {
    /// Student id, also encoded in the card barcode.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Books currently checked out. Codes are unique within this list.
    pub books: Vec<Book>,

    /// When the student was added.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Finds a checked-out book by code.
    pub fn find_book(&self, code: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.code == code)
    }

    /// Returns true if the code is currently checked out to this student.
    pub fn has_book(&self, code: &str) -> bool {
        self.find_book(code).is_some()
    }

    /// Returns the book list with `code` removed, plus the removed book.
    pub fn without_book(&self, code: &str) -> (Vec<Book>, Option<Book>) {
        let mut removed = None;
        let remaining = self
            .books
            .iter()
            .filter(|b| {
                if b.code == code && removed.is_none() {
                    removed = Some((*b).clone());
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();
        (remaining, removed)
    }
}

// =============================================================================
// Book
// =============================================================================

/// A lent item, identified by the scanned code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Book {
    /// Catalog key, usually an ISBN.
    pub code: String,

    pub title: String,

    pub author: String,

    /// Cover image URL.
    pub cover: Option<String>,

    /// When the book was checked out. Rows written by older versions may lack it.
    #[ts(as = "Option<String>")]
    pub checkout_date: Option<DateTime<Utc>>,

    /// When the book was returned. Always `None` while checked out.
    #[ts(as = "Option<String>")]
    pub checkin_date: Option<DateTime<Utc>>,
}

impl Book {
    /// Creates a freshly checked-out book.
    pub fn checkout(code: impl Into<String>, metadata: BookMetadata, now: DateTime<Utc>) -> Self {
        Book {
            code: code.into(),
            title: metadata.title,
            author: metadata.author,
            cover: metadata.cover,
            checkout_date: Some(now),
            checkin_date: None,
        }
    }

    /// Title for messages, falling back to the code.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.code
        } else {
            &self.title
        }
    }
}

// =============================================================================
// Metadata
// =============================================================================

/// Bibliographic data for a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub cover: Option<String>,
}

impl BookMetadata {
    /// Metadata used when every source came up empty.
    pub fn placeholder() -> Self {
        BookMetadata {
            title: UNKNOWN_TITLE.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            cover: None,
        }
    }

    /// Returns true if this is the placeholder record.
    pub fn is_placeholder(&self) -> bool {
        self.title == UNKNOWN_TITLE && self.author == UNKNOWN_AUTHOR && self.cover.is_none()
    }
}

impl From<&CatalogEntry> for BookMetadata {
    fn from(entry: &CatalogEntry) -> Self {
        BookMetadata {
            title: entry.title.clone(),
            author: entry.author.clone(),
            cover: entry.cover.clone(),
        }
    }
}

/// Which link of the resolver chain produced the metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum MetadataSource {
    /// The user's curated catalog.
    Catalog,
    /// Lower-trust entries created locally by older versions.
    LegacyCatalog,
    /// External bibliographic lookup.
    External,
    /// Nothing matched.
    Placeholder,
}

impl std::fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataSource::Catalog => write!(f, "catalog"),
            MetadataSource::LegacyCatalog => write!(f, "legacy_catalog"),
            MetadataSource::External => write!(f, "external"),
            MetadataSource::Placeholder => write!(f, "placeholder"),
        }
    }
}

// =============================================================================
// Catalog Entry
// =============================================================================

/// A user-curated code → metadata mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogEntry {
    pub code: String,
    pub title: String,
    pub author: String,
    pub cover: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// History
// =============================================================================

/// What happened in a history record. Only returns are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum HistoryAction {
    Checkin,
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryAction::Checkin => write!(f, "checkin"),
        }
    }
}

impl std::str::FromStr for HistoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkin" => Ok(HistoryAction::Checkin),
            other => Err(format!("Unknown history action: '{}'", other)),
        }
    }
}

/// Immutable log entry written once per returned book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HistoryRecord {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub student_id: String,

    /// Name at the time of the return.
    pub student_name: String,

    /// Snapshot of the book, with `checkin_date` set.
    pub book: Book,

    pub action: HistoryAction,

    #[ts(as = "String")]
    pub occurred_at: DateTime<Utc>,
}

// =============================================================================
// Book Change
// =============================================================================

/// The mutation committed together with a new book list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookChange {
    /// A book was appended to the student's list.
    Checkout { book: Book },
    /// A book was removed; the record must be appended in the same commit.
    Checkin { record: HistoryRecord },
}

impl BookChange {
    /// Code of the book this change is about.
    pub fn code(&self) -> &str {
        match self {
            BookChange::Checkout { book } => &book.code,
            BookChange::Checkin { record } => &record.book.code,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            BookChange::Checkout { .. } => "checkout",
            BookChange::Checkin { .. } => "checkin",
        }
    }
}
