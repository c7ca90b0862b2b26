//! `SQLite` storage for the processed-file ledger.
//!
//! This module provides:
//! - Connection management with WAL mode
//! - Versioned schema migrations
//! - The fingerprint-keyed [`ProcessedFileLedger`]

mod connection;
mod ledger;
mod models;
mod schema;

pub use connection::Database;
pub use ledger::{ProcessedFileLedger, MAX_FAILED_ATTEMPTS};
pub use models::{LedgerEntry, Outcome};
pub use schema::{migrate, verify_schema, SCHEMA_VERSION};
