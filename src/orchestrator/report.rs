//! Per-pass counters.

/// What one orchestration pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Regular files in the scan folder.
    pub files_found: u64,
    /// Files with a scanner default name.
    pub files_matched: u64,
    /// Document groups formed.
    pub groups: u64,
    /// Groups left alone because the ledger already covers them.
    pub groups_skipped: u64,
    /// Groups whose description failed.
    pub groups_failed: u64,
    /// Files renamed.
    pub files_renamed: u64,
    /// Files skipped because they vanished before their rename.
    pub files_skipped: u64,
    /// Files that could not be renamed or described.
    pub files_failed: u64,
}

impl PassReport {
    /// Whether anything failed during the pass.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.groups_failed > 0 || self.files_failed > 0
    }

    /// Emit the report as one structured log line.
    pub fn log(&self) {
        tracing::info!(
            files_found = self.files_found,
            files_matched = self.files_matched,
            groups = self.groups,
            groups_skipped = self.groups_skipped,
            groups_failed = self.groups_failed,
            files_renamed = self.files_renamed,
            files_skipped = self.files_skipped,
            files_failed = self.files_failed,
            "Pass complete"
        );
    }
}
