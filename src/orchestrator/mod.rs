//! Naming passes over the scan folder.
//!
//! A pass lists the folder, groups scans into documents, asks the describer
//! for a title per document, renames the pages and records every outcome in
//! the processed-file ledger.

mod agent;
mod report;

pub use agent::NamingOrchestrator;
pub use report::PassReport;
