//! Discovery, classification and grouping of scan files.

mod classifier;
mod grouper;
mod models;
mod scanner;

pub use classifier::{classify, is_scan_name, ScanName};
pub use grouper::{DocumentGrouper, GROUPING_WINDOW};
pub use models::{DocumentGroup, Fingerprint, ScanFile};
pub use scanner::{diagnose_folder, scan_folder, DiagnosticEntry, EntryKind, FolderListing};
