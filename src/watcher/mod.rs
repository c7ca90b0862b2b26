//! Run loops and scan folder watching.
//!
//! This module provides:
//! - [`WatchLoop`] running passes once or continuously
//! - Debounced watching of the scan folder using notify-rs
//! - Graceful shutdown on SIGINT/SIGTERM

mod events;
mod watch_loop;
#[allow(clippy::module_inception)]
mod watcher;

pub use events::EventBatch;
pub use watch_loop::{shutdown_signal, RunMode, WatchLoop};
pub use watcher::{ScanFolderWatcher, DEBOUNCE_DURATION};
