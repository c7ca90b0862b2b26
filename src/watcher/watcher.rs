//! Scan folder watcher using notify-rs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use tokio::sync::mpsc;

use super::events::EventBatch;
use crate::error::WatcherError;
use crate::Result;

/// Quiet period before a batch is delivered, so the scanner app can finish
/// writing the file.
pub const DEBOUNCE_DURATION: Duration = Duration::from_secs(2);

/// Pending batches beyond this are dropped; a pass is already due.
const CHANNEL_CAPACITY: usize = 16;

/// Watches the top level of the scan folder for new scans.
pub struct ScanFolderWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    event_rx: mpsc::Receiver<EventBatch>,
    folder: PathBuf,
}

impl ScanFolderWatcher {
    /// Start watching `folder` with the default debounce.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder does not exist or cannot be watched.
    pub fn new(folder: impl AsRef<Path>) -> Result<Self> {
        Self::with_debounce(folder, DEBOUNCE_DURATION)
    }

    /// Start watching `folder`, delivering batches after `debounce` of quiet.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder does not exist or cannot be watched.
    pub fn with_debounce(folder: impl AsRef<Path>, debounce: Duration) -> Result<Self> {
        let folder = folder.as_ref().to_path_buf();

        if !folder.is_dir() {
            return Err(WatcherError::WatchFailed {
                path: folder.display().to_string(),
                reason: "directory does not exist".to_string(),
            }
            .into());
        }

        let (batch_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let mut debouncer = new_debouncer(
            debounce,
            move |result: std::result::Result<
                Vec<notify_debouncer_mini::DebouncedEvent>,
                notify::Error,
            >| {
                match result {
                    Ok(events) => {
                        let mut batch = EventBatch::new();
                        for event in events {
                            if matches!(event.kind, DebouncedEventKind::Any) {
                                batch.add(event.path);
                            }
                        }

                        if !batch.is_empty() && batch_tx.try_send(batch).is_err() {
                            tracing::trace!("Scan event dropped, a pass is already pending");
                        }
                    }
                    Err(e) => {
                        tracing::error!("Watch error: {:?}", e);
                    }
                }
            },
        )
        .map_err(|e| WatcherError::WatchFailed {
            path: folder.display().to_string(),
            reason: e.to_string(),
        })?;

        debouncer
            .watcher()
            .watch(&folder, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::WatchFailed {
                path: folder.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %folder.display(), "Watching scan folder");

        Ok(Self {
            _debouncer: debouncer,
            event_rx,
            folder,
        })
    }

    /// Receive the next batch of new scans.
    ///
    /// Returns `None` if the watcher has been dropped.
    pub async fn recv(&mut self) -> Option<EventBatch> {
        self.event_rx.recv().await
    }

    /// Watched folder.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

impl std::fmt::Debug for ScanFolderWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanFolderWatcher")
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_watcher_nonexistent_dir() {
        let result = ScanFolderWatcher::new("/nonexistent/directory");
        assert!(result.is_err());
    }

    #[test]
    fn test_watcher_rejects_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(ScanFolderWatcher::new(&file).is_err());
    }

    #[tokio::test]
    async fn test_watcher_reports_new_scan() {
        let tmp = TempDir::new().unwrap();
        let mut watcher =
            ScanFolderWatcher::with_debounce(tmp.path(), Duration::from_millis(200)).unwrap();
        assert_eq!(watcher.folder(), tmp.path());

        std::fs::write(tmp.path().join("notes.txt"), b"ignored").unwrap();
        let scan = tmp.path().join("3_28_25, 12_50 PM Microsoft Lens.jpg");
        std::fs::write(&scan, b"x").unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(10), watcher.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(batch.paths.iter().all(|p| p.file_name() == scan.file_name()));
        assert!(!batch.is_empty());
    }
}
