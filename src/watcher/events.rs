//! Scan arrival events.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Path, PathBuf};

use crate::scan::is_scan_name;

/// Batch of scan files that appeared or changed since the last batch.
#[derive(Debug, Default)]
pub struct EventBatch {
    /// Paths with a scanner default name, without duplicates.
    pub paths: Vec<PathBuf>,
}

impl EventBatch {
    /// Create a new empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `path` if it names a scan that is still present.
    ///
    /// Returns whether the path was kept. Events for the agent's own renames
    /// are dropped here: the old name is gone and the new one is not a scan
    /// name.
    pub fn add(&mut self, path: PathBuf) -> bool {
        if !is_relevant(&path) {
            return false;
        }
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
        true
    }

    /// Check if batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Get total number of paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

fn is_relevant(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_scan_name)
        && path.is_file()
}
