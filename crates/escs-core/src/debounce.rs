//! # Scan Debouncer
//!
//! Turns bursty scanner keystrokes into discrete scan codes.
//!
//! ## State Machine
//! ```text
//!                 push(c)                 submit / settle timeout
//!   ┌────────┐ ───────────► ┌────────────┐ ──────────────────────► ┌─────────────┐
//!   │  Idle  │              │ Collecting │   (not a duplicate)     │ Dispatching │
//!   └────────┘ ◄─────────── └────────────┘                         └──────┬──────┘
//!       ▲       empty buffer   │  duplicate (< min interval)              │
//!       │       or duplicate   ▼                                          │
//!       │                  DroppedDuplicate                               │
//!       │                                                                 │
//!       └──────────────────────── finish() ◄──────────────────────────────┘
//!                      (processing completed or failed)
//! ```
//!
//! Keystrokes arriving while `Dispatching` still accumulate, but whatever they
//! flush to is dropped as busy. Nothing is ever queued behind the scan in
//! flight.
//!
//! The debouncer never reads a clock itself. Every call takes `now`, so tests
//! drive it with [`ManualClock`](crate::clock::ManualClock) and the station
//! drives it with tokio time.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::{DEFAULT_MIN_SCAN_INTERVAL_MS, DEFAULT_SETTLE_WINDOW_MS};

// =============================================================================
// Types
// =============================================================================

/// A completed scan, ready for the decision engine. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEvent {
    /// Trimmed, non-empty code.
    pub code: String,

    #[serde(skip)]
    pub received_at: Instant,
}

/// Debouncer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Collecting { buffer: String, last_key: Instant },
    /// A scan is being processed. `stray` holds keys typed meanwhile.
    Dispatching {
        code: String,
        stray: String,
        last_key: Option<Instant>,
    },
}

/// Result of flushing the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Hand this event to the engine, then call [`ScanDebouncer::finish`].
    Dispatch(ScanEvent),
    /// Nothing to flush (empty buffer or settle window still open).
    Nothing,
    /// Flushed while a scan was in flight.
    DroppedBusy { code: String },
    /// Flushed too soon after the previous dispatch.
    DroppedDuplicate { code: String },
}

// =============================================================================
// Debouncer
// =============================================================================

#[derive(Debug, Clone)]
pub struct ScanDebouncer {
    settle_window: Duration,
    min_interval: Duration,
    state: ScanState,
    last_dispatched: Option<Instant>,
}

impl Default for ScanDebouncer {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_SETTLE_WINDOW_MS),
            Duration::from_millis(DEFAULT_MIN_SCAN_INTERVAL_MS),
        )
    }
}

impl ScanDebouncer {
    pub fn new(settle_window: Duration, min_interval: Duration) -> Self {
        ScanDebouncer {
            settle_window,
            min_interval,
            state: ScanState::Idle,
            last_dispatched: None,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// True while a dispatched scan has not been finished.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, ScanState::Dispatching { .. })
    }

    /// The code currently being processed.
    pub fn in_flight(&self) -> Option<&str> {
        match &self.state {
            ScanState::Dispatching { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Adds one keystroke and restarts the settle window.
    ///
    /// Control characters are ignored; the terminator key maps to [`submit`](Self::submit).
    pub fn push(&mut self, c: char, now: Instant) {
        if c.is_control() {
            return;
        }

        match &mut self.state {
            ScanState::Idle => {
                self.state = ScanState::Collecting {
                    buffer: c.to_string(),
                    last_key: now,
                };
            }
            ScanState::Collecting { buffer, last_key } => {
                buffer.push(c);
                *last_key = now;
            }
            ScanState::Dispatching {
                stray, last_key, ..
            } => {
                stray.push(c);
                *last_key = Some(now);
            }
        }
    }

    /// When the settle timer fires, if a buffer is pending.
    pub fn settle_deadline(&self) -> Option<Instant> {
        match &self.state {
            ScanState::Idle => None,
            ScanState::Collecting { last_key, .. } => Some(*last_key + self.settle_window),
            ScanState::Dispatching {
                stray, last_key, ..
            } => {
                if stray.is_empty() {
                    None
                } else {
                    last_key.map(|t| t + self.settle_window)
                }
            }
        }
    }

    /// Flushes the pending buffer if the settle window has elapsed.
    pub fn poll(&mut self, now: Instant) -> FlushOutcome {
        match self.settle_deadline() {
            Some(deadline) if now >= deadline => self.flush(now),
            _ => FlushOutcome::Nothing,
        }
    }

    /// Flushes the pending buffer immediately (terminator key).
    pub fn submit(&mut self, now: Instant) -> FlushOutcome {
        self.flush(now)
    }

    /// Leaves `Dispatching`. Called once processing completes or fails.
    pub fn finish(&mut self) {
        if self.is_busy() {
            self.state = ScanState::Idle;
        }
    }

    fn flush(&mut self, now: Instant) -> FlushOutcome {
        match &mut self.state {
            ScanState::Idle => FlushOutcome::Nothing,
            ScanState::Dispatching {
                stray, last_key, ..
            } => {
                let code = std::mem::take(stray).trim().to_string();
                *last_key = None;
                if code.is_empty() {
                    FlushOutcome::Nothing
                } else {
                    FlushOutcome::DroppedBusy { code }
                }
            }
            ScanState::Collecting { buffer, .. } => {
                let code = buffer.trim().to_string();
                self.state = ScanState::Idle;

                if code.is_empty() {
                    return FlushOutcome::Nothing;
                }

                let too_soon = self
                    .last_dispatched
                    .map(|t| now.saturating_duration_since(t) < self.min_interval)
                    .unwrap_or(false);
                if too_soon {
                    return FlushOutcome::DroppedDuplicate { code };
                }

                self.last_dispatched = Some(now);
                self.state = ScanState::Dispatching {
                    code: code.clone(),
                    stray: String::new(),
                    last_key: None,
                };
                FlushOutcome::Dispatch(ScanEvent {
                    code,
                    received_at: now,
                })
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
