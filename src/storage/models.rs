//! Ledger records.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scan::ScanFile;

/// What happened to a scan file during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The file now lives at `to`.
    Renamed { to: PathBuf },
    /// Nothing was done, e.g. the file vanished before its rename.
    Skipped { reason: String },
    /// Describing or renaming failed.
    Failed { reason: String },
}

impl Outcome {
    /// Failure outcome from any displayable error.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::Failed {
            reason: reason.to_string(),
        }
    }

    /// Skip outcome with a reason.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Column value stored in `ledger_entries.outcome`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Renamed { .. } => "renamed",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    /// Column value stored in `ledger_entries.detail`.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Renamed { to } => to.to_string_lossy().into_owned(),
            Self::Skipped { reason } | Self::Failed { reason } => reason.clone(),
        }
    }

    /// Rebuild from the stored columns.
    #[must_use]
    pub fn from_columns(kind: &str, detail: Option<String>) -> Option<Self> {
        let detail = detail.unwrap_or_default();
        match kind {
            "renamed" => Some(Self::Renamed {
                to: PathBuf::from(detail),
            }),
            "skipped" => Some(Self::Skipped { reason: detail }),
            "failed" => Some(Self::Failed { reason: detail }),
            _ => None,
        }
    }

    /// Whether the outcome is a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One processed file, keyed by the fingerprint of the original file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Fingerprint key (blake3 hex).
    pub key: String,

    /// Path the file had when it was discovered.
    pub original_path: String,

    /// File size in bytes at discovery.
    pub size: i64,

    /// Modification timestamp (Unix seconds) at discovery.
    pub mtime: i64,

    /// Latest outcome.
    #[serde(flatten)]
    pub outcome: Outcome,

    /// Number of passes that processed this file.
    pub attempts: u32,

    /// Unix timestamp of the latest outcome.
    pub processed_at: i64,
}

impl LedgerEntry {
    /// Create an entry for `file` with a first outcome.
    #[must_use]
    pub fn new(file: &ScanFile, outcome: Outcome) -> Self {
        Self {
            key: file.fingerprint().key(),
            original_path: file.path.to_string_lossy().into_owned(),
            size: i64::try_from(file.size).unwrap_or(i64::MAX),
            mtime: file.modified,
            outcome,
            attempts: 1,
            processed_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Replace the outcome after another attempt.
    pub fn update(&mut self, outcome: Outcome) {
        self.outcome = outcome;
        self.attempts = self.attempts.saturating_add(1);
        self.processed_at = chrono::Utc::now().timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn file() -> ScanFile {
        let at = NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        ScanFile::new("/scans/4_1_25, 9_00 AM Microsoft Lens.pdf", at, 2048, 1_743_500_000)
    }

    #[test]
    fn test_outcome_columns_round_trip() {
        for outcome in [
            Outcome::Renamed {
                to: PathBuf::from("/scans/Lease_Agreement.pdf"),
            },
            Outcome::skipped("file no longer exists"),
            Outcome::failed("empty response"),
        ] {
            let rebuilt = Outcome::from_columns(outcome.kind(), Some(outcome.detail()));
            assert_eq!(rebuilt, Some(outcome));
        }
        assert_eq!(Outcome::from_columns("exploded", None), None);
    }

    #[test]
    fn test_entry_new_and_update() {
        let mut entry = LedgerEntry::new(&file(), Outcome::failed("timeout"));
        assert_eq!(entry.attempts, 1);
        assert_eq!(entry.size, 2048);
        assert_eq!(entry.key, file().fingerprint().key());
        assert!(entry.outcome.is_failure());

        entry.update(Outcome::Renamed {
            to: PathBuf::from("/scans/Lease_Agreement.pdf"),
        });
        assert_eq!(entry.attempts, 2);
        assert!(!entry.outcome.is_failure());
        assert!(entry.processed_at > 0);
    }

    #[test]
    fn test_entry_serializes_flat() {
        let entry = LedgerEntry::new(&file(), Outcome::skipped("vanished"));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "vanished");
        assert_eq!(json["attempts"], 1);
    }
}
