//! # Repository Module
//!
//! Database repository implementations for ESCS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  escs-scan (SQLite LibraryStore)                                       │
//! │       │                                                                 │
//! │       │  db.students().replace_books(id, &books, Some(&record))        │
//! │       ▼                                                                 │
//! │  StudentRepository                                                     │
//! │  ├── list / get / add / remove                                         │
//! │  └── replace_books ──► one transaction ──► HistoryRepository insert    │
//! │                                                                         │
//! │  HistoryRepository        append-only, newest first                    │
//! │  CatalogRepository        curated + legacy tables                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StudentRepository`](student::StudentRepository) - Students and their checked-out books
//! - [`HistoryRepository`](history::HistoryRepository) - Return history
//! - [`CatalogRepository`](catalog::CatalogRepository) - Curated and legacy catalog

pub mod catalog;
pub mod history;
pub mod student;
