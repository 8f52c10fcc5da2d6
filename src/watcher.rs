use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::time::Instant;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::WatchError;
use crate::{ChangeEvent, ChangeKind, ErrorReporter, EventSource, Received, WatchMessage};

/// Notifications buffered while the command runs.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Create a bounded message queue between the watcher callback and the
/// engine.
pub fn event_queue(capacity: usize) -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    let dropped = Arc::new(AtomicUsize::new(0));
    (
        EventSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        EventQueue { rx, dropped },
    )
}

/// Producer half. Never blocks: a full queue drops the message and counts it.
#[derive(Clone)]
pub struct EventSender {
    tx: SyncSender<WatchMessage>,
    dropped: Arc<AtomicUsize>,
}

impl EventSender {
    /// Returns false once the receiving side is gone.
    pub fn deliver(&self, message: WatchMessage) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half, read by the engine.
pub struct EventQueue {
    rx: Receiver<WatchMessage>,
    dropped: Arc<AtomicUsize>,
}

impl EventSource for EventQueue {
    fn recv_until(&mut self, deadline: Instant) -> Received {
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            return Received::Message(WatchMessage::Error(format!(
                "event queue overflowed, {} notifications dropped",
                dropped
            )));
        }

        let wait = deadline.saturating_duration_since(Instant::now());
        match self.rx.recv_timeout(wait) {
            Ok(message) => Received::Message(message),
            Err(RecvTimeoutError::Timeout) => Received::TimedOut,
            Err(RecvTimeoutError::Disconnected) => Received::Closed,
        }
    }
}

/// Translate one notify callback into zero or more messages.
fn forward(sender: &EventSender, result: notify::Result<Event>) {
    match result {
        Ok(event) => {
            let Some(kind) = ChangeKind::from_notify(&event.kind) else {
                return;
            };
            for path in event.paths {
                if !sender.deliver(WatchMessage::Change(ChangeEvent::new(path, kind))) {
                    break;
                }
            }
        }
        Err(err) => {
            sender.deliver(WatchMessage::Error(err.to_string()));
        }
    }
}

/// Watches individual paths (non-recursively) and feeds the engine.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    queue: EventQueue,
    watched: Vec<PathBuf>,
}

impl FileWatcher {
    pub fn new(capacity: usize) -> Result<Self, WatchError> {
        let (sender, queue) = event_queue(capacity);
        let watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            forward(&sender, result);
        })?;

        Ok(Self {
            watcher,
            queue,
            watched: Vec::new(),
        })
    }

    pub fn watch<P: AsRef<Path>>(&mut self, path: P) -> Result<(), WatchError> {
        let path = path.as_ref();
        self.watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::CannotWatch {
                path: path.to_path_buf(),
                source,
            })?;
        self.watched.push(path.to_path_buf());
        Ok(())
    }

    /// Register every path, reporting the ones that fail. Succeeds as long
    /// as at least one path is being watched; returns how many are.
    pub fn watch_all<P, E>(&mut self, paths: &[P], reporter: &mut E) -> Result<usize, WatchError>
    where
        P: AsRef<Path>,
        E: ErrorReporter,
    {
        for path in paths {
            if let Err(err) = self.watch(path) {
                reporter.report(&err.to_string());
            }
        }

        if self.watched.is_empty() {
            return Err(WatchError::NothingWatched);
        }
        tracing::info!("Watching {} of {} path(s)", self.watched.len(), paths.len());
        Ok(self.watched.len())
    }

    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

impl EventSource for FileWatcher {
    fn recv_until(&mut self, deadline: Instant) -> Received {
        self.queue.recv_until(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, EventKind};

    fn change(path: &str) -> WatchMessage {
        WatchMessage::Change(ChangeEvent::new(path, ChangeKind::WRITTEN))
    }

    #[test]
    fn test_queue_delivers_in_order() {
        let (tx, mut rx) = event_queue(4);
        tx.deliver(change("a"));
        tx.deliver(change("b"));

        let now = Instant::now();
        assert_eq!(rx.recv_until(now), Received::Message(change("a")));
        assert_eq!(rx.recv_until(now), Received::Message(change("b")));
        assert_eq!(rx.recv_until(now), Received::TimedOut);
    }

    #[test]
    fn test_overflow_is_reported_not_silent() {
        let (tx, mut rx) = event_queue(1);
        tx.deliver(change("a"));
        tx.deliver(change("b"));
        tx.deliver(change("c"));

        let now = Instant::now();
        match rx.recv_until(now) {
            Received::Message(WatchMessage::Error(message)) => {
                assert!(message.contains("2 notifications dropped"), "{}", message);
            }
            other => panic!("Expected overflow error, got {:?}", other),
        }
        assert_eq!(rx.recv_until(now), Received::Message(change("a")));
        assert_eq!(rx.recv_until(now), Received::TimedOut);
    }

    #[test]
    fn test_closed_once_sender_dropped() {
        let (tx, mut rx) = event_queue(1);
        drop(tx);

        assert_eq!(rx.recv_until(Instant::now()), Received::Closed);
    }

    #[test]
    fn test_forward_splits_paths_and_drops_access() {
        let (tx, mut rx) = event_queue(8);
        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("x"))
            .add_path(PathBuf::from("y"));
        forward(&tx, Ok(created));
        forward(&tx, Ok(Event::new(EventKind::Access(AccessKind::Any)).add_path(PathBuf::from("z"))));

        let now = Instant::now();
        let expected = |p: &str| Received::Message(WatchMessage::Change(ChangeEvent::new(p, ChangeKind::CREATED)));
        assert_eq!(rx.recv_until(now), expected("x"));
        assert_eq!(rx.recv_until(now), expected("y"));
        assert_eq!(rx.recv_until(now), Received::TimedOut);
    }

    #[test]
    fn test_forward_passes_errors_through() {
        let (tx, mut rx) = event_queue(2);
        forward(&tx, Err(notify::Error::generic("backend exploded")));

        match rx.recv_until(Instant::now()) {
            Received::Message(WatchMessage::Error(message)) => assert!(message.contains("backend exploded")),
            other => panic!("Expected error message, got {:?}", other),
        }
    }
}
