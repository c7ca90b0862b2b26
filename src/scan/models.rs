//! Data models for discovered scan files and document groups.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use super::classifier::classify;

/// A file produced by the scanner app under its default name.
///
/// Identity is the path; the value never changes after discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFile {
    /// Full path to the file.
    pub path: PathBuf,

    /// Raw file name as found on disk.
    pub file_name: String,

    /// Lower-case extension without the dot.
    pub extension: String,

    /// Capture time parsed from the file name.
    pub captured_at: NaiveDateTime,

    /// File size in bytes.
    pub size: u64,

    /// Modification timestamp (Unix seconds).
    pub modified: i64,
}

impl ScanFile {
    /// Create a scan file record from already known values.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, captured_at: NaiveDateTime, size: u64, modified: i64) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            path,
            file_name,
            extension,
            captured_at,
            size,
            modified,
        }
    }

    /// Classify a path and read its metadata.
    ///
    /// Returns `None` for anything that is not a regular file with a scanner
    /// default name, including files whose metadata cannot be read.
    #[must_use]
    pub fn discover(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let scan_name = classify(name)?;

        let metadata = match std::fs::metadata(path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read scan metadata");
                return None;
            }
        };

        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX));

        Some(Self {
            path: path.to_path_buf(),
            file_name: name.to_string(),
            extension: scan_name.extension,
            captured_at: scan_name.captured_at,
            size: metadata.len(),
            modified,
        })
    }

    /// Whether the file is a PDF (possibly multi-page on its own).
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.extension == "pdf"
    }

    /// Stable identity of the original file for the ledger.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            path: self.path.clone(),
            size: self.size,
            modified: self.modified,
        }
    }
}

/// Path, size and modification time of a file before it was renamed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub path: PathBuf,
    pub size: u64,
    pub modified: i64,
}

impl Fingerprint {
    /// Hex digest used as the ledger key.
    #[must_use]
    pub fn key(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.path.to_string_lossy().as_bytes());
        hasher.update(&[0]);
        hasher.update(&self.size.to_le_bytes());
        hasher.update(&self.modified.to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Scan files believed to be pages of one document, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentGroup {
    files: Vec<ScanFile>,
}

impl DocumentGroup {
    pub(crate) fn new(first: ScanFile) -> Self {
        Self { files: vec![first] }
    }

    pub(crate) fn push(&mut self, file: ScanFile) {
        self.files.push(file);
    }

    /// Pages in capture order.
    #[must_use]
    pub fn files(&self) -> &[ScanFile] {
        &self.files
    }

    /// The page sent to the content describer.
    #[must_use]
    pub fn first(&self) -> &ScanFile {
        &self.files[0]
    }

    /// The most recently captured page.
    #[must_use]
    pub fn last(&self) -> &ScanFile {
        &self.files[self.files.len() - 1]
    }

    /// Number of pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Groups always hold at least one page.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Extension shared by every page.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.first().extension
    }
}
