//! Deterministic test harness: a clock that only moves when the scripted
//! source says so, and collaborators that record what the engine did.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use onchange::{
    Batch, ChangeEvent, ChangeKind, Clock, CommandRunner, ErrorReporter, EventSource, Received, WatchMessage,
};

#[derive(Clone)]
pub struct ManualClock {
    start: Instant,
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        let start = Instant::now();
        Self {
            start,
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn at(&self, offset: Duration) -> Instant {
        self.start + offset
    }

    pub fn elapsed(&self) -> Duration {
        self.now.get() - self.start
    }

    fn advance_to(&self, instant: Instant) {
        if instant > self.now.get() {
            self.now.set(instant);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Delivers messages at fixed offsets from the clock's start and reports
/// `Closed` once the script is exhausted and `end` is passed.
pub struct ScriptedSource {
    clock: ManualClock,
    script: VecDeque<(Duration, WatchMessage)>,
    end: Duration,
}

impl ScriptedSource {
    pub fn new(clock: &ManualClock, end: Duration) -> Self {
        Self {
            clock: clock.clone(),
            script: VecDeque::new(),
            end,
        }
    }

    pub fn change(mut self, at_ms: u64, path: &str, kind: ChangeKind) -> Self {
        let message = WatchMessage::Change(ChangeEvent::new(path, kind));
        self.script.push_back((Duration::from_millis(at_ms), message));
        self
    }

    pub fn error(mut self, at_ms: u64, message: &str) -> Self {
        self.script
            .push_back((Duration::from_millis(at_ms), WatchMessage::Error(message.to_string())));
        self
    }
}

impl EventSource for ScriptedSource {
    fn recv_until(&mut self, deadline: Instant) -> Received {
        if let Some((at, _)) = self.script.front() {
            let at = self.clock.at(*at);
            if at <= deadline {
                self.clock.advance_to(at);
                let (_, message) = self.script.pop_front().expect("front was just checked");
                return Received::Message(message);
            }
        }

        let end = self.clock.at(self.end);
        if self.script.is_empty() && deadline > end {
            self.clock.advance_to(end);
            return Received::Closed;
        }

        self.clock.advance_to(deadline);
        Received::TimedOut
    }
}

/// A flush as seen by the runner, stamped with the time it happened.
#[derive(Debug, Clone)]
pub struct Flush {
    pub at: Duration,
    pub batch: Batch,
}

impl Flush {
    pub fn kind_of(&self, path: &str) -> Option<ChangeKind> {
        self.batch.changes.get(Path::new(path)).copied()
    }
}

pub struct RecordingRunner {
    clock: ManualClock,
    run_time: Duration,
    pub flushes: Rc<RefCell<Vec<Flush>>>,
}

impl RecordingRunner {
    pub fn new(clock: &ManualClock) -> Self {
        Self {
            clock: clock.clone(),
            run_time: Duration::ZERO,
            flushes: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Pretend every command takes `run_time` to finish.
    pub fn with_run_time(mut self, run_time: Duration) -> Self {
        self.run_time = run_time;
        self
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, batch: &Batch) {
        self.flushes.borrow_mut().push(Flush {
            at: self.clock.elapsed(),
            batch: batch.clone(),
        });
        self.clock.advance_to(self.clock.now() + self.run_time);
    }
}

#[derive(Clone, Default)]
pub struct CollectingReporter {
    pub messages: Rc<RefCell<Vec<String>>>,
}

impl ErrorReporter for CollectingReporter {
    fn report(&mut self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
