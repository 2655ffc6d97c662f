//! Monotonic clock and fixed-rate tick scheduling

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock {
    /// Time since the clock's origin; never decreases
    fn now(&self) -> Duration;
}

/// Wall clock backed by `Instant`
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for simulation and tests
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to `t`; earlier times are ignored to stay monotonic
    pub fn set(&self, t: Duration) {
        self.now.set(self.now.get().max(t));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Fixed-rate tick gate
///
/// Fires at most once per check. On firing the reference moves to *now*
/// rather than advancing by one interval, so a long stall yields a single
/// tick instead of a burst of catch-up ticks.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval: Duration,
    last_tick: Duration,
}

impl TickScheduler {
    pub fn new(interval: Duration, now: Duration) -> Self {
        Self {
            interval,
            last_tick: now,
        }
    }

    /// Tick interval for a refresh rate in Hz
    ///
    /// Rates too small to express saturate at `Duration::MAX`.
    pub fn interval_for(refresh_hz: f64) -> Duration {
        Duration::try_from_secs_f64(1.0 / refresh_hz).unwrap_or(Duration::MAX)
    }

    /// Is a tick due at `now`? Records the tick if so.
    pub fn due(&mut self, now: Duration) -> bool {
        if now.saturating_sub(self.last_tick) >= self.interval {
            self.mark(now);
            true
        } else {
            false
        }
    }

    /// Record a tick fired at `now`
    pub fn mark(&mut self, now: Duration) {
        self.last_tick = self.last_tick.max(now);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_tick(&self) -> Duration {
        self.last_tick
    }
}
