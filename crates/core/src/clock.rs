//! Clock abstraction for testable time handling.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A clock that provides the current time, abstracted so debounce, retry,
/// and cron timing can be driven deterministically under test.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    instant: Arc<Mutex<Instant>>,
    utc: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { instant: Arc::new(Mutex::new(Instant::now())), utc: Arc::new(Mutex::new(Utc::now())) }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.instant.lock() += duration;
        if let Ok(delta) = chrono::Duration::from_std(duration) {
            *self.utc.lock() += delta;
        }
    }

    pub fn set_utc(&self, at: DateTime<Utc>) {
        *self.utc.lock() = at;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.instant.lock()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        *self.utc.lock()
    }
}
