//! The trigger loop.
//!
//! Everything runs on one thread: the engine blocks in
//! [`EventSource::recv_until`] until either a watcher message arrives or the
//! nearest timer deadline passes, handles exactly one [`Signal`], and goes
//! back to waiting. Running the command blocks the loop; notifications that
//! arrive meanwhile queue up in the source.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use crate::{
    ChangeEvent, ChangeFilter, ChangeKind, Clock, FlushReason, PendingSet, Scheduler, SystemClock, Timing,
    WatchMessage,
};

/// Result of waiting on an [`EventSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Message(WatchMessage),
    /// The deadline passed with nothing to deliver.
    TimedOut,
    /// The sending side is gone; nothing will ever arrive again.
    Closed,
}

/// Something that delivers watcher messages.
pub trait EventSource {
    /// Block until a message is available or `deadline` has passed.
    /// A message that is already queued is returned even if the deadline
    /// is in the past.
    fn recv_until(&mut self, deadline: Instant) -> Received;
}

/// One unit of work for the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Change(ChangeEvent),
    WatchError(String),
    DebounceFired,
    TimeoutFired,
}

/// The pending changes handed to the command runner on a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub reason: FlushReason,
    pub changes: BTreeMap<PathBuf, ChangeKind>,
}

impl Batch {
    /// Changed paths in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.changes.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Runs the user's command for a batch. Failures are the runner's business;
/// the loop carries on regardless.
pub trait CommandRunner {
    fn run(&mut self, batch: &Batch);
}

/// Receives watcher problems as text.
pub trait ErrorReporter {
    fn report(&mut self, message: &str);
}

/// Reports through the `tracing` error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&mut self, message: &str) {
        tracing::error!("{}", message);
    }
}

pub struct TriggerEngine<R, E, C = SystemClock> {
    filter: ChangeFilter,
    pending: PendingSet,
    scheduler: Scheduler,
    runner: R,
    reporter: E,
    clock: C,
    flushes: u64,
}

impl<R: CommandRunner, E: ErrorReporter> TriggerEngine<R, E, SystemClock> {
    pub fn new(filter: ChangeFilter, timing: Timing, runner: R, reporter: E) -> Self {
        Self::with_clock(filter, timing, runner, reporter, SystemClock)
    }
}

impl<R: CommandRunner, E: ErrorReporter, C: Clock> TriggerEngine<R, E, C> {
    pub fn with_clock(filter: ChangeFilter, timing: Timing, runner: R, reporter: E, clock: C) -> Self {
        let scheduler = Scheduler::new(timing, clock.now());
        Self {
            filter,
            pending: PendingSet::new(),
            scheduler,
            runner,
            reporter,
            clock,
            flushes: 0,
        }
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Number of flushes performed so far, including the startup one.
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// Run the command once straight away, then service the source until it
    /// closes.
    pub fn run<S: EventSource>(&mut self, source: &mut S) {
        self.flush(FlushReason::Startup);

        while let Some(signal) = self.next_signal(source) {
            self.handle(signal);
        }

        tracing::debug!("Event source closed, stopping");
    }

    /// Wait for whichever comes first: a message from the source or the
    /// next timer deadline. Returns `None` once the source is closed.
    pub fn next_signal<S: EventSource>(&mut self, source: &mut S) -> Option<Signal> {
        loop {
            match self.scheduler.expired(self.clock.now()) {
                Some(FlushReason::Debounce) => return Some(Signal::DebounceFired),
                Some(FlushReason::Timeout) => return Some(Signal::TimeoutFired),
                Some(FlushReason::Startup) | None => {}
            }

            match source.recv_until(self.scheduler.next_deadline()) {
                Received::Message(WatchMessage::Change(event)) => return Some(Signal::Change(event)),
                Received::Message(WatchMessage::Error(message)) => return Some(Signal::WatchError(message)),
                Received::TimedOut => continue,
                Received::Closed => return None,
            }
        }
    }

    pub fn handle(&mut self, signal: Signal) {
        match signal {
            Signal::Change(event) => self.observe(event),
            Signal::WatchError(message) => self.reporter.report(&message),
            Signal::DebounceFired => self.flush(FlushReason::Debounce),
            Signal::TimeoutFired => self.flush(FlushReason::Timeout),
        }
    }

    fn observe(&mut self, event: ChangeEvent) {
        if !self.filter.admit(&event) {
            tracing::trace!("Ignoring {} on {}", event.kind, event.path.display());
            return;
        }

        tracing::debug!("Change {} on {}", event.kind, event.path.display());
        self.pending.record(event.path, event.kind);
        self.scheduler.event_observed(self.clock.now());
    }

    /// Hand the pending set to the runner and start a new cycle. The hard
    /// timeout counts from when the command finished.
    pub fn flush(&mut self, reason: FlushReason) {
        let batch = Batch {
            reason,
            changes: self.pending.flush_and_clear(),
        };

        tracing::debug!("Flushing {} changed path(s) ({})", batch.changes.len(), reason);
        self.runner.run(&batch);
        self.flushes += 1;

        self.scheduler.flushed(self.clock.now());
    }
}
