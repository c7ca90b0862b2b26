//! Single-shot and continuous run loops.

use std::future::Future;
use std::time::Duration;

use tokio::signal;

use super::events::EventBatch;
use super::watcher::ScanFolderWatcher;
use crate::config::Config;
use crate::orchestrator::NamingOrchestrator;

/// How long the agent keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One pass, then exit.
    Once,
    /// Pass, wait up to `interval` (or until new scans appear), repeat.
    Continuous { interval: Duration },
}

impl RunMode {
    /// Mode selected by `config`.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        if config.continuous {
            Self::Continuous {
                interval: config.check_interval,
            }
        } else {
            Self::Once
        }
    }
}

/// Runs orchestration passes according to a [`RunMode`].
#[derive(Debug)]
pub struct WatchLoop {
    orchestrator: NamingOrchestrator,
    mode: RunMode,
    force: bool,
}

impl WatchLoop {
    /// Create a loop. `force` applies to the first pass only.
    #[must_use]
    pub const fn new(orchestrator: NamingOrchestrator, mode: RunMode, force: bool) -> Self {
        Self {
            orchestrator,
            mode,
            force,
        }
    }

    /// Run until the mode is exhausted or SIGINT/SIGTERM arrives.
    ///
    /// Returns the number of passes completed.
    pub async fn run(self) -> usize {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = tx.send(());
        });

        self.run_until(async move {
            // A dropped sender means no signal handler; keep running.
            if rx.await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until the mode is exhausted or `shutdown` completes.
    ///
    /// Shutdown is only observed between passes; a pass in progress always
    /// finishes. Returns the number of passes completed.
    pub async fn run_until<F>(mut self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut watcher = match self.mode {
            RunMode::Once => None,
            RunMode::Continuous { .. } => {
                match ScanFolderWatcher::new(&self.orchestrator.config().scan_folder) {
                    Ok(watcher) => Some(watcher),
                    Err(e) => {
                        tracing::warn!(error = %e, "Folder watching unavailable, polling only");
                        None
                    }
                }
            }
        };

        let mut force = self.force;
        let mut passes = 0;

        loop {
            let report = self.orchestrator.run_pass(force).await;
            passes += 1;
            force = false;
            tracing::debug!(passes, renamed = report.files_renamed, "Pass finished");

            let RunMode::Continuous { interval } = self.mode else {
                break;
            };

            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping");
                    break;
                }
                () = tokio::time::sleep(interval) => {
                    tracing::debug!("Check interval elapsed");
                }
                Some(batch) = next_batch(&mut watcher) => {
                    tracing::info!(files = batch.len(), "New scans detected");
                }
            }
        }

        passes
    }
}

async fn next_batch(watcher: &mut Option<ScanFolderWatcher>) -> Option<EventBatch> {
    match watcher {
        Some(watcher) => watcher.recv().await,
        None => std::future::pending().await,
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
///
/// If a handler cannot be installed the error is logged and that signal is
/// never reported.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
