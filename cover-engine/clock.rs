//! Time sources and the cooldown limiter built on them

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic time source, measured from an arbitrary fixed origin
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Duration;
}

/// Wall-independent clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: Duration) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// Minimum spacing between successive acquisitions
#[derive(Debug)]
pub struct Cooldown<C: Clock> {
    clock: C,
    interval: Duration,
    last: Mutex<Option<Duration>>,
}

impl<C: Clock> Cooldown<C> {
    pub fn new(clock: C, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            last: Mutex::new(None),
        }
    }

    /// Record an acquisition at the current time if the interval has elapsed
    /// since the previous one. Check and record happen under one lock.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut last = self.last.lock();
        match *last {
            Some(prev) if now.saturating_sub(prev) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Time left before the next acquisition can succeed
    pub fn remaining(&self) -> Duration {
        match *self.last.lock() {
            Some(prev) => self.interval.saturating_sub(self.clock.now().saturating_sub(prev)),
            None => Duration::ZERO,
        }
    }

    pub fn last_acquired(&self) -> Option<Duration> {
        *self.last.lock()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
