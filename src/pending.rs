use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::ChangeKind;

/// Paths changed since the last flush, each with the most recent kind seen.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    changes: BTreeMap<PathBuf, ChangeKind>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `path`.
    pub fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        self.changes.insert(path, kind);
    }

    /// Hand over everything recorded so far and start again empty.
    pub fn flush_and_clear(&mut self) -> BTreeMap<PathBuf, ChangeKind> {
        std::mem::take(&mut self.changes)
    }

    pub fn get(&self, path: &Path) -> Option<ChangeKind> {
        self.changes.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
