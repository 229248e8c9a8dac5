//! # escs-db: Database Layer for ESCS
//!
//! This crate provides database access for the checkout station.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          ESCS Data Flow                                 │
//! │                                                                         │
//! │  escs-scan (LibraryStore::update_books)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     escs-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ StudentRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ HistoryRepo   │    │ 001_initial  │  │   │
//! │  │   │               │    │ CatalogRepo   │    │  _schema.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/escs.db                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (students, history, catalog)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use escs_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/escs.db")).await?;
//!
//! let student = db.students().add("Ada Lovelace").await?;
//! let history = db.history().list_for_student(&student.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::history::HistoryRepository;
pub use repository::student::StudentRepository;
