//! One pass over the scan folder: discover, group, describe, rename, record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Instrument;

use super::report::PassReport;
use crate::config::Config;
use crate::describe::{load_representative, ContentDescriber, PdfRasterizer};
use crate::error::{DescribeError, NamingError};
use crate::naming::{ConflictResolver, NamingDecision};
use crate::scan::{scan_folder, DocumentGroup, DocumentGrouper, ScanFile};
use crate::storage::{Outcome, ProcessedFileLedger};

/// Drives naming passes over the configured scan folder.
///
/// Groups are handled strictly one after another. A failure while
/// describing or renaming is recorded against the files involved and the
/// pass moves on.
pub struct NamingOrchestrator {
    config: Config,
    describer: Arc<dyn ContentDescriber>,
    rasterizer: Arc<dyn PdfRasterizer>,
    grouper: DocumentGrouper,
    ledger: ProcessedFileLedger,
}

impl NamingOrchestrator {
    /// Create an orchestrator and load the ledger from the data directory.
    #[must_use]
    pub fn new(
        config: Config,
        describer: Arc<dyn ContentDescriber>,
        rasterizer: Arc<dyn PdfRasterizer>,
    ) -> Self {
        let ledger = ProcessedFileLedger::load(config.ledger_path());
        Self::with_ledger(config, describer, rasterizer, ledger)
    }

    /// Create an orchestrator around an already loaded ledger.
    #[must_use]
    pub fn with_ledger(
        config: Config,
        describer: Arc<dyn ContentDescriber>,
        rasterizer: Arc<dyn PdfRasterizer>,
        ledger: ProcessedFileLedger,
    ) -> Self {
        Self {
            config,
            describer,
            rasterizer,
            grouper: DocumentGrouper::default(),
            ledger,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Processed-file ledger.
    #[must_use]
    pub const fn ledger(&self) -> &ProcessedFileLedger {
        &self.ledger
    }

    /// Run one full pass.
    ///
    /// With `force`, groups already covered by the ledger are processed
    /// again. Never fails: problems are logged, recorded and counted.
    pub async fn run_pass(&mut self, force: bool) -> PassReport {
        let span = tracing::info_span!(
            "pass",
            folder = %self.config.scan_folder.display(),
            force
        );
        self.pass(force).instrument(span).await
    }

    async fn pass(&mut self, force: bool) -> PassReport {
        let mut report = PassReport::default();

        let listing = scan_folder(&self.config.scan_folder);
        report.files_found = listing.files_found;
        report.files_matched = listing.scans.len() as u64;

        let groups = self.grouper.group(listing.scans);
        report.groups = groups.len() as u64;

        let mut resolver = ConflictResolver::new();
        for group in groups {
            if !force && group.files().iter().all(|f| self.ledger.is_processed(f)) {
                tracing::debug!(
                    first = %group.first().file_name,
                    pages = group.len(),
                    "Group already processed"
                );
                report.groups_skipped += 1;
                continue;
            }

            self.process_group(group, &mut resolver, &mut report).await;
        }

        match self.ledger.flush() {
            Ok(written) => tracing::debug!(entries = written, "Ledger updated"),
            Err(e) => tracing::warn!(error = %e, "Failed to persist ledger"),
        }

        report.log();
        report
    }

    async fn process_group(
        &mut self,
        group: DocumentGroup,
        resolver: &mut ConflictResolver,
        report: &mut PassReport,
    ) {
        tracing::info!(
            first = %group.first().file_name,
            pages = group.len(),
            "Processing document"
        );

        let title = match self.describe(&group).await {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!(
                    first = %group.first().file_name,
                    error = %e,
                    "Could not describe document, leaving it unnamed"
                );
                report.groups_failed += 1;
                for file in group.files() {
                    self.ledger.record(file, Outcome::failed(&e));
                    report.files_failed += 1;
                }
                return;
            }
        };

        let decision = NamingDecision::new(group, &title);
        tracing::debug!(raw = %title, title = %decision.title(), "Title chosen");

        for (file, target) in decision.group().files().iter().zip(decision.targets()) {
            let outcome = rename_into_place(file, target, resolver);
            match &outcome {
                Outcome::Renamed { .. } => report.files_renamed += 1,
                Outcome::Skipped { .. } => report.files_skipped += 1,
                Outcome::Failed { .. } => report.files_failed += 1,
            }
            self.ledger.record(file, outcome);
        }
    }

    async fn describe(&self, group: &DocumentGroup) -> Result<String, DescribeError> {
        let image = load_representative(group.first(), self.rasterizer.as_ref()).await?;
        self.describer.describe(&image).await
    }
}

impl std::fmt::Debug for NamingOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamingOrchestrator")
            .field("config", &self.config)
            .field("grouper", &self.grouper)
            .field("ledger_entries", &self.ledger.len())
            .finish_non_exhaustive()
    }
}

/// Tries per file when a target appears between resolving and renaming.
const MAX_RENAME_ATTEMPTS: u32 = 3;

/// Move `file` to a free variant of `target`.
fn rename_into_place(file: &ScanFile, target: &Path, resolver: &mut ConflictResolver) -> Outcome {
    if std::fs::symlink_metadata(&file.path).is_err() {
        tracing::info!(path = %file.path.display(), "File vanished before rename");
        return Outcome::skipped("file no longer exists");
    }

    match place(&file.path, target, resolver) {
        Ok(to) => {
            tracing::info!(from = %file.file_name, to = %to.display(), "Renamed");
            Outcome::Renamed { to }
        }
        Err(e) => {
            tracing::warn!(path = %file.path.display(), error = %e, "Rename failed");
            Outcome::failed(e)
        }
    }
}

fn place(
    from: &Path,
    target: &Path,
    resolver: &mut ConflictResolver,
) -> Result<PathBuf, NamingError> {
    let mut attempt = 1;
    loop {
        let to = resolver.resolve(target)?;
        match move_no_clobber(from, &to) {
            Ok(()) => return Ok(to),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_RENAME_ATTEMPTS => {
                tracing::debug!(to = %to.display(), "Target appeared before rename, trying next name");
                attempt += 1;
            }
            Err(e) => return Err(NamingError::rename(from, &to, e)),
        }
    }
}

/// Move `from` to `to`, failing with `AlreadyExists` instead of replacing
/// whatever is at `to`.
fn move_no_clobber(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::hard_link(from, to) {
        Ok(()) => {
            if let Err(e) = std::fs::remove_file(from) {
                let _ = std::fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(e),
        // No hard links here (FAT, some network shares): check, then rename.
        Err(_) => {
            if std::fs::symlink_metadata(to).is_ok() {
                return Err(ErrorKind::AlreadyExists.into());
            }
            std::fs::rename(from, to)
        }
    }
}
