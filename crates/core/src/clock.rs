// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock abstraction for task ages and statistics timestamps.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A clock that provides the current wall-clock time.
///
/// Task ages are compared against file modification times, so this is
/// `SystemTime` based rather than monotonic.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> SystemTime;

    /// Seconds since the Unix epoch (the unit stored in `retracestats`).
    fn epoch_secs(&self) -> i64 {
        self.now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
    }
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<SystemTime>>,
}

impl FakeClock {
    /// Start at the real current time so file mtimes line up.
    pub fn new() -> Self {
        Self { current: Arc::new(Mutex::new(SystemTime::now())) }
    }

    pub fn at(time: SystemTime) -> Self {
        Self { current: Arc::new(Mutex::new(time)) }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        *self.current.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
