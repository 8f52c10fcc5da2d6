use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;

use notify::event::ModifyKind;
use notify::EventKind;

/// Set of filesystem change kinds.
///
/// Used both as the kind reported for a single notification and as the
/// filter mask a notification has to fit inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangeKind(u8);

impl ChangeKind {
    pub const CREATED: ChangeKind = ChangeKind(1);
    pub const WRITTEN: ChangeKind = ChangeKind(1 << 1);
    pub const REMOVED: ChangeKind = ChangeKind(1 << 2);
    pub const RENAMED: ChangeKind = ChangeKind(1 << 3);
    pub const METADATA: ChangeKind = ChangeKind(1 << 4);
    pub const ALL: ChangeKind = ChangeKind(0b1_1111);

    const LETTERS: [(char, ChangeKind); 5] = [
        ('c', ChangeKind::CREATED),
        ('w', ChangeKind::WRITTEN),
        ('r', ChangeKind::REMOVED),
        ('m', ChangeKind::RENAMED),
        ('a', ChangeKind::METADATA),
    ];

    pub const fn empty() -> Self {
        ChangeKind(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is also set in `self`.
    pub const fn contains(self, other: ChangeKind) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_subset_of(self, mask: ChangeKind) -> bool {
        mask.contains(self)
    }

    /// Kind for a single mask letter (`c`, `w`, `r`, `m`, `a`).
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::LETTERS
            .iter()
            .find(|(c, _)| *c == letter)
            .map(|(_, kind)| *kind)
    }

    /// Map a notify event kind. Access and unclassified events have no
    /// counterpart and yield `None`.
    pub fn from_notify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::CREATED),
            EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::RENAMED),
            EventKind::Modify(ModifyKind::Metadata(_)) => Some(ChangeKind::METADATA),
            EventKind::Modify(_) => Some(ChangeKind::WRITTEN),
            EventKind::Remove(_) => Some(ChangeKind::REMOVED),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
        }
    }
}

impl BitOr for ChangeKind {
    type Output = ChangeKind;

    fn bitor(self, rhs: ChangeKind) -> ChangeKind {
        ChangeKind(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChangeKind {
    fn bitor_assign(&mut self, rhs: ChangeKind) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (letter, kind) in Self::LETTERS {
            if self.contains(kind) {
                write!(f, "{}", letter)?;
            }
        }
        Ok(())
    }
}

/// A single change notification for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// What the watcher delivers to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMessage {
    Change(ChangeEvent),
    Error(String),
}
