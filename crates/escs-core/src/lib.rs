//! # escs-core: Pure Logic for the Checkout Station
//!
//! This crate holds the parts of the scan-driven checkout engine that need no
//! I/O: domain types, validation, the selection context, the keystroke
//! debouncer state machine and history record construction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          ESCS Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Scanner (keyboard wedge)                        │   │
//! │  │         '9' '7' '8' ... '3' <Enter>   (raw keystrokes)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ escs-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ debounce  │  │ selection │  │  history  │  │   │
//! │  │   │  Student  │  │ ScanEvent │  │ Selection │  │ Checkin   │  │   │
//! │  │   │   Book    │  │ Debouncer │  │  Context  │  │  records  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • INJECTED CLOCK           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            escs-scan (decision engine, resolver chain)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Student, Book, HistoryRecord, CatalogEntry, ...)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation (scan codes, names, catalog entries)
//! - [`clock`] - Injectable time source
//! - [`selection`] - Which students subsequent scans address
//! - [`debounce`] - Keystroke debouncer state machine
//! - [`history`] - History record construction for check-ins
//!
//! ## Example Usage
//!
//! ```rust
//! use std::time::Duration;
//! use escs_core::clock::{Clock, ManualClock};
//! use escs_core::debounce::{FlushOutcome, ScanDebouncer};
//!
//! let clock = ManualClock::new();
//! let mut debouncer = ScanDebouncer::new(Duration::from_millis(200), Duration::from_millis(500));
//!
//! for c in "12345678".chars() {
//!     debouncer.push(c, clock.now());
//! }
//!
//! match debouncer.submit(clock.now()) {
//!     FlushOutcome::Dispatch(event) => assert_eq!(event.code, "12345678"),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod debounce;
pub mod error;
pub mod history;
pub mod selection;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use debounce::{FlushOutcome, ScanDebouncer, ScanEvent, ScanState};
pub use error::{CoreError, CoreResult, ValidationError};
pub use selection::{SelectMode, SelectionContext};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Quiet period after the last keystroke before a buffered scan is flushed.
pub const DEFAULT_SETTLE_WINDOW_MS: u64 = 200;

/// Minimum time between two dispatched scans.
///
/// A single physical scan sometimes arrives as two logical submissions
/// (terminator key plus settle timeout). The second one lands well inside
/// this window and is discarded.
pub const DEFAULT_MIN_SCAN_INTERVAL_MS: u64 = 500;

/// Upper bound for the external bibliographic lookup.
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5_000;

/// Title recorded when no metadata source knows a code.
pub const UNKNOWN_TITLE: &str = "Unknown Book";

/// Author recorded when no metadata source knows a code.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
