//! Debounce and hard-timeout bookkeeping.
//!
//! The scheduler never sleeps or spawns anything. It only tracks two
//! deadlines against instants handed in by the caller, which keeps it
//! usable from a single-threaded loop and from tests with a fake clock.

use std::fmt;
use std::time::{Duration, Instant};

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// The two durations that drive flushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Quiet period after the last admitted event.
    pub debounce: Duration,
    /// Longest allowed gap between two flushes.
    pub timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            timeout: Duration::from_secs(12 * 60 * 60),
        }
    }
}

/// Why a flush happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    Startup,
    Debounce,
    Timeout,
}

impl fmt::Display for FlushReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlushReason::Startup => "startup",
            FlushReason::Debounce => "debounce",
            FlushReason::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    timing: Timing,
    debounce_at: Option<Instant>,
    timeout_at: Instant,
}

impl Scheduler {
    /// Debounce starts disarmed; the hard timeout counts from `now`.
    pub fn new(timing: Timing, now: Instant) -> Self {
        Self {
            timing,
            debounce_at: None,
            timeout_at: deadline(now, timing.timeout),
        }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debounce_at
    }

    pub fn timeout_deadline(&self) -> Instant {
        self.timeout_at
    }

    /// An admitted event restarts the debounce countdown. The hard timeout
    /// is left alone so a steady stream of events cannot starve it.
    pub fn event_observed(&mut self, now: Instant) {
        self.debounce_at = Some(deadline(now, self.timing.debounce));
    }

    /// Which timer, if any, has run out at `now`. Debounce wins a tie.
    pub fn expired(&self, now: Instant) -> Option<FlushReason> {
        if self.debounce_at.is_some_and(|at| at <= now) {
            return Some(FlushReason::Debounce);
        }
        if self.timeout_at <= now {
            return Some(FlushReason::Timeout);
        }
        None
    }

    /// Record a completed flush: debounce waits for the next event and the
    /// hard timeout restarts from `now`.
    pub fn flushed(&mut self, now: Instant) {
        self.debounce_at = None;
        self.timeout_at = deadline(now, self.timing.timeout);
    }

    /// The earliest instant at which `expired` can change its answer.
    pub fn next_deadline(&self) -> Instant {
        match self.debounce_at {
            Some(at) => at.min(self.timeout_at),
            None => self.timeout_at,
        }
    }
}

// Instant addition panics on overflow, so absurd durations are clamped.
fn deadline(now: Instant, after: Duration) -> Instant {
    const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

    now.checked_add(after)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
