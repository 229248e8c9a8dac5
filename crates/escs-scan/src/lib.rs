//! # escs-scan: Scan Engine for ESCS
//!
//! This crate turns a raw stream of scanner keystrokes into a debounced,
//! serialized sequence of student selections, check-outs and check-ins.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scan Engine Architecture                         │
//! │                                                                         │
//! │   KeyInput ──► ScanStation (select! loop)                              │
//! │                  │  ScanDebouncer (escs-core)                          │
//! │                  │  SelectionContext (escs-core)                       │
//! │                  ▼                                                      │
//! │              CheckoutEngine                                             │
//! │                  │                                                      │
//! │     ┌────────────┼──────────────┬──────────────────┐                   │
//! │     ▼            ▼              ▼                  ▼                    │
//! │  LibraryStore  Metadata      HistoryRecorder    RenderSync             │
//! │  (students,    Resolver      (check-in          (refetch,              │
//! │   commits)     (chain)        records)           render)               │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │           MetadataLookup (Open Library over reqwest)                   │
//! │                                                                         │
//! │  Every user-visible effect goes through the ScanUi trait.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`station`] - `ScanStation` session driver
//! - [`engine`] - `CheckoutEngine` decision logic
//! - [`resolver`] - Metadata resolver chain
//! - [`lookup`] - External bibliographic lookup
//! - [`recorder`] - History recorder
//! - [`render`] - Post-commit refresh
//! - [`store`] - `LibraryStore` trait and SQLite implementation
//! - [`ui`] - `ScanUi` trait
//! - [`config`] - Scanner configuration
//! - [`error`] - Scan error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use escs_scan::{CheckoutEngine, MetadataResolver, ScanConfig, ScanStation};
//!
//! let config = ScanConfig::load_or_default(None);
//! let store = Arc::new(database);
//! let resolver = MetadataResolver::standard(store.clone(), lookup, config.lookup.timeout());
//! let engine = CheckoutEngine::new(store, resolver, ui);
//!
//! let mut station = ScanStation::new(engine, &config.scanner);
//! let stats = station.run(keys_rx).await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod recorder;
pub mod render;
pub mod resolver;
pub mod station;
pub mod store;
pub mod ui;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{LookupSettings, ScanConfig, ScannerSettings, StoreSettings};
pub use engine::{CheckoutEngine, ScanOutcome};
pub use error::{ScanError, ScanResult};
pub use lookup::{LookupResult, MetadataLookup, OpenLibraryLookup};
pub use recorder::HistoryRecorder;
pub use render::RenderSync;
pub use resolver::{BookSource, MetadataResolver, Resolved};
pub use station::{KeyInput, ScanStation, SelectionCommand, StationStats, TokioClock};
pub use store::LibraryStore;
pub use ui::{NoOpUi, ScanUi, Severity};
