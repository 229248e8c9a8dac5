//! # Clock
//!
//! Time source for the debouncer and for record timestamps.
//!
//! Two readings are needed: a monotonic [`Instant`] for the settle window and
//! duplicate interval, and a wall-clock [`DateTime<Utc>`] for checkout,
//! checkin and history dates. Both come from the same clock so tests can move
//! them together.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Injectable time source.
pub trait Clock: Send + Sync {
    /// Monotonic reading.
    fn now(&self) -> Instant;

    /// Wall-clock reading.
    fn utc_now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    wall_origin: DateTime<Utc>,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Creates a clock whose wall-clock reading starts at `wall`.
    pub fn starting_at(wall: DateTime<Utc>) -> Self {
        ManualClock {
            origin: Instant::now(),
            wall_origin: wall,
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves both readings forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        let offset = chrono::Duration::from_std(self.offset()).unwrap_or_else(|_| chrono::Duration::zero());
        self.wall_origin + offset
    }
}
