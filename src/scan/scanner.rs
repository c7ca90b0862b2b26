//! Non-recursive listing of the scan folder.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use walkdir::WalkDir;

use super::classifier::classify;
use super::models::ScanFile;

/// Result of listing the scan folder once.
#[derive(Debug, Default)]
pub struct FolderListing {
    /// Regular files seen directly in the folder.
    pub files_found: u64,
    /// Files with a scanner default name, in file-name order.
    pub scans: Vec<ScanFile>,
    /// Entries that could not be read.
    pub errors: u64,
}

/// List the regular files directly inside `folder` and keep the scans.
///
/// Subdirectories are not descended into. Unreadable entries are logged and
/// counted, never fatal.
#[must_use]
pub fn scan_folder(folder: &Path) -> FolderListing {
    let mut listing = FolderListing::default();

    for entry in walk(folder) {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                listing.files_found += 1;

                if let Some(scan) = ScanFile::discover(entry.path()) {
                    listing.scans.push(scan);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error listing scan folder");
                listing.errors += 1;
            }
        }
    }

    tracing::debug!(
        path = %folder.display(),
        files = listing.files_found,
        scans = listing.scans.len(),
        "Listed scan folder"
    );
    listing
}

/// How a folder entry was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory, ignored by the agent.
    Directory,
    /// A scan with the capture time taken from its name.
    Scan { captured_at: NaiveDateTime },
    /// Any other entry.
    Other,
}

/// One entry of a diagnostic listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    /// Entry path.
    pub path: PathBuf,
    /// Classification.
    pub kind: EntryKind,
}

impl std::fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        match &self.kind {
            EntryKind::Directory => write!(f, "[dir]   {name}"),
            EntryKind::Scan { captured_at } => {
                write!(f, "[scan]  {name}  (captured {captured_at})")
            }
            EntryKind::Other => write!(f, "[skip]  {name}  {:?}", name.as_ref()),
        }
    }
}

/// Classify every entry of `folder` without touching anything.
///
/// Non-matching names are shown with their escaped form so unusual
/// whitespace (such as U+202F) is visible.
#[must_use]
pub fn diagnose_folder(folder: &Path) -> Vec<DiagnosticEntry> {
    walk(folder)
        .filter_map(|entry| {
            entry
                .map_err(|e| tracing::warn!(error = %e, "Error listing scan folder"))
                .ok()
        })
        .map(|entry| {
            let kind = if entry.file_type().is_dir() {
                EntryKind::Directory
            } else {
                entry
                    .file_name()
                    .to_str()
                    .and_then(classify)
                    .map_or(EntryKind::Other, |scan| EntryKind::Scan {
                        captured_at: scan.captured_at,
                    })
            };
            DiagnosticEntry {
                path: entry.into_path(),
                kind,
            }
        })
        .collect()
}

fn walk(folder: &Path) -> walkdir::IntoIter {
    WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("3_28_25, 12_50 PM Microsoft Lens.jpg"), b"a").unwrap();
        fs::write(tmp.path().join("4_1_25, 9_00 AM Microsoft Lens.pdf"), b"b").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"c").unwrap();
        fs::create_dir(tmp.path().join("3_28_25, 1_00 PM Microsoft Lens.jpg")).unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(
            tmp.path().join("nested").join("3_28_25, 12_52 PM Microsoft Lens.jpg"),
            b"d",
        )
        .unwrap();
        tmp
    }

    #[test]
    fn test_scan_folder_is_flat() {
        let tmp = fixture();
        let listing = scan_folder(tmp.path());

        assert_eq!(listing.files_found, 3);
        assert_eq!(listing.errors, 0);
        let names: Vec<_> = listing.scans.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(
            names,
            ["3_28_25, 12_50 PM Microsoft Lens.jpg", "4_1_25, 9_00 AM Microsoft Lens.pdf"]
        );
    }

    #[test]
    fn test_scan_folder_missing() {
        let listing = scan_folder(Path::new("/nonexistent/scan/folder"));
        assert_eq!(listing.files_found, 0);
        assert_eq!(listing.errors, 1);
    }

    #[test]
    fn test_diagnose_folder() {
        let tmp = fixture();
        let entries = diagnose_folder(tmp.path());
        assert_eq!(entries.len(), 5);

        let kind_of = |name: &str| {
            entries
                .iter()
                .find(|e| e.path.file_name().unwrap() == name)
                .map(|e| e.kind.clone())
                .unwrap()
        };
        assert!(matches!(
            kind_of("3_28_25, 12_50 PM Microsoft Lens.jpg"),
            EntryKind::Scan { .. }
        ));
        assert_eq!(kind_of("notes.txt"), EntryKind::Other);
        assert_eq!(kind_of("nested"), EntryKind::Directory);
        assert_eq!(
            kind_of("3_28_25, 1_00 PM Microsoft Lens.jpg"),
            EntryKind::Directory
        );
    }

    #[test]
    fn test_diagnostic_display() {
        let entry = DiagnosticEntry {
            path: PathBuf::from("/scans/odd\u{202f}name.jpg"),
            kind: EntryKind::Other,
        };
        let line = entry.to_string();
        assert!(line.starts_with("[skip]"));
        assert!(line.contains("\\u{202f}"));
    }
}
