//! # Scan Station
//!
//! Owns one scanning session: the debouncer, the student selection and the
//! engine.
//!
//! ## Event Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ScanStation::run                                  │
//! │                                                                         │
//! │   loop {                                                                │
//! │       select! {                                                         │
//! │           input    = inputs.recv()     → debouncer.push / submit,       │
//! │                                            selection commands           │
//! │           deadline = sleep_until(..)   → debouncer.poll                 │
//! │           done     = in_flight         → restore selection, finish      │
//! │       }                                                                 │
//! │   }                                                                     │
//! │                                                                         │
//! │   Keys keep flowing while a scan is in flight. Anything they spell out  │
//! │   before it completes is dropped as busy.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Selection commands share the key channel, so they apply in the order the
//! user issued them relative to scans. One that arrives while a scan is in
//! flight waits until the scan finishes.
//!
//! When the channel closes, a buffer that never got its terminator is flushed
//! like a submit.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ScannerSettings;
use crate::engine::{CheckoutEngine, ScanOutcome};
use crate::ui::Severity;
use escs_core::{Clock, FlushOutcome, ScanDebouncer, SelectMode, SelectionContext};

/// One unit of station input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    /// The terminator key (Enter).
    Submit,
    /// An explicit selection action from the UI.
    Select(SelectionCommand),
}

/// Selection changes that do not come from scanning a student card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCommand {
    Select { id: String, mode: SelectMode },
    /// Every student currently in the store.
    SelectAll,
    Clear,
}

/// Counters for one `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationStats {
    pub dispatched: u64,
    pub dropped_busy: u64,
    pub dropped_duplicate: u64,
}

/// Clock that follows tokio's timer, including paused test time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

type InFlight = Pin<Box<dyn Future<Output = (SelectionContext, Option<ScanOutcome>)> + Send>>;

enum Step {
    Key(Option<KeyInput>),
    Settled,
    Done(SelectionContext, Option<ScanOutcome>),
}

// =============================================================================
// Scan Station
// =============================================================================

pub struct ScanStation {
    debouncer: ScanDebouncer,
    selection: SelectionContext,
    engine: CheckoutEngine,
    stats: StationStats,
}

impl ScanStation {
    pub fn new(engine: CheckoutEngine, settings: &ScannerSettings) -> Self {
        ScanStation {
            debouncer: ScanDebouncer::new(settings.settle_window(), settings.min_scan_interval()),
            selection: SelectionContext::new(),
            engine,
            stats: StationStats::default(),
        }
    }

    pub fn selection(&self) -> &SelectionContext {
        &self.selection
    }

    /// Mutable access before `run` starts or after it returns. While running,
    /// send [`KeyInput::Select`] instead.
    pub fn selection_mut(&mut self) -> &mut SelectionContext {
        &mut self.selection
    }

    pub fn engine(&self) -> &CheckoutEngine {
        &self.engine
    }

    pub fn stats(&self) -> StationStats {
        self.stats
    }

    /// Drives the session until `keys` closes and the in-flight scan, if
    /// any, has finished.
    pub async fn run(&mut self, mut keys: mpsc::Receiver<KeyInput>) -> StationStats {
        let clock = self.engine.clock().clone();
        let mut in_flight: Option<InFlight> = None;
        let mut deferred: VecDeque<SelectionCommand> = VecDeque::new();
        let mut keys_open = true;

        info!("Scan station started");

        loop {
            if !keys_open && in_flight.is_none() {
                break;
            }

            let deadline = self.debouncer.settle_deadline();

            let step = tokio::select! {
                key = keys.recv(), if keys_open => Step::Key(key),
                _ = sleep_until(deadline), if deadline.is_some() => Step::Settled,
                (selection, outcome) = wait_for(&mut in_flight) => Step::Done(selection, outcome),
            };

            match step {
                Step::Key(Some(KeyInput::Char(c))) => self.debouncer.push(c, clock.now()),
                Step::Key(Some(KeyInput::Submit)) => {
                    let flushed = self.debouncer.submit(clock.now());
                    self.on_flush(flushed, &mut in_flight);
                }
                Step::Key(Some(KeyInput::Select(command))) => {
                    if in_flight.is_some() {
                        debug!(?command, "Selection command deferred until the scan finishes");
                        deferred.push_back(command);
                    } else {
                        self.apply_selection(command).await;
                    }
                }
                Step::Key(None) => {
                    debug!("Key channel closed");
                    keys_open = false;

                    let flushed = self.debouncer.submit(clock.now());
                    self.on_flush(flushed, &mut in_flight);
                }
                Step::Settled => {
                    let flushed = self.debouncer.poll(clock.now());
                    self.on_flush(flushed, &mut in_flight);
                }
                Step::Done(selection, outcome) => {
                    in_flight = None;
                    self.selection = selection;

                    // Keys typed during processing never become a scan.
                    let stray = self.debouncer.submit(clock.now());
                    self.on_flush(stray, &mut in_flight);
                    self.debouncer.finish();

                    debug!(?outcome, "Scan finished");

                    while let Some(command) = deferred.pop_front() {
                        self.apply_selection(command).await;
                    }
                }
            }
        }

        info!(
            dispatched = self.stats.dispatched,
            dropped_busy = self.stats.dropped_busy,
            dropped_duplicate = self.stats.dropped_duplicate,
            "Scan station stopped"
        );
        self.stats
    }

    async fn apply_selection(&mut self, command: SelectionCommand) {
        match command {
            SelectionCommand::Select { id, mode } => self.selection.select(id, mode),
            SelectionCommand::SelectAll => match self.engine.store().students().await {
                Ok(students) => self.selection.select_all(students.into_iter().map(|s| s.id)),
                Err(e) => {
                    warn!(error = %e, "Select all failed");
                    self.engine.ui().notify(&e.to_string(), Severity::Error);
                    return;
                }
            },
            SelectionCommand::Clear => self.selection.clear(),
        }

        debug!(selected = self.selection.count(), "Selection changed");
        self.engine.ui().selection_changed(&self.selection);
    }

    fn on_flush(&mut self, flushed: FlushOutcome, in_flight: &mut Option<InFlight>) {
        match flushed {
            FlushOutcome::Nothing => {}
            FlushOutcome::Dispatch(event) => {
                self.stats.dispatched += 1;
                debug!(code = %event.code, "Dispatching scan");

                let engine = self.engine.clone();
                let mut selection = std::mem::take(&mut self.selection);
                *in_flight = Some(Box::pin(async move {
                    let outcome = engine.handle(&mut selection, &event).await;
                    (selection, outcome)
                }));
            }
            FlushOutcome::DroppedBusy { code } => {
                self.stats.dropped_busy += 1;
                debug!(code = %code, in_flight = ?self.debouncer.in_flight(), "Scan dropped while busy");
            }
            FlushOutcome::DroppedDuplicate { code } => {
                self.stats.dropped_duplicate += 1;
                debug!(code = %code, "Duplicate scan suppressed");
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

async fn wait_for(in_flight: &mut Option<InFlight>) -> (SelectionContext, Option<ScanOutcome>) {
    match in_flight {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}
