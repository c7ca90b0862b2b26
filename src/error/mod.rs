//! Error types and Result aliases for scan-namer.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.
//!
//! Only [`Error::Config`] is fatal to the program. Every other kind is
//! confined to the file or document group that produced it.

use thiserror::Error;

/// Result type alias using scan-namer's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for scan-namer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Processed-file ledger error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Content describer or rasterizer error.
    #[error("describe error: {0}")]
    Describe(#[from] DescribeError),

    /// Naming or rename error.
    #[error("naming error: {0}")]
    Naming(#[from] NamingError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Ledger-specific errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// `SQLite` database error.
    #[error("database error: {0}")]
    Database(String),

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The ledger file is not a usable `SQLite` database.
    #[error("ledger corrupt: {0}")]
    Corrupt(String),

    /// The ledger has no backing store to write to.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the content describer and the PDF rasterizer.
#[derive(Error, Debug)]
pub enum DescribeError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The service answered but proposed no title.
    #[error("empty response")]
    EmptyResponse,

    /// First-page extraction from a PDF failed.
    #[error("rasterization failed: {0}")]
    Rasterize(String),

    /// Reading or re-encoding the image failed.
    #[error("image error: {0}")]
    Image(String),
}

/// Naming and rename errors.
#[derive(Error, Debug)]
pub enum NamingError {
    /// No free path was found for a desired target.
    #[error("no free name for '{path}' after {attempts} attempts")]
    Conflict { path: String, attempts: u32 },

    /// The filesystem refused the rename.
    #[error("failed to rename '{from}' to '{to}': {reason}")]
    Rename {
        from: String,
        to: String,
        reason: String,
    },
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error must stop the program before any processing.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl NamingError {
    /// Create a rename error from the two paths involved.
    pub fn rename(
        from: &std::path::Path,
        to: &std::path::Path,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Rename {
            from: from.display().to_string(),
            to: to.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl LedgerError {
    /// Wrap a `SQLite` failure, keeping corruption apart from busy or I/O errors.
    pub fn sqlite(context: &str, err: &rusqlite::Error) -> Self {
        if is_corruption(err) {
            Self::Corrupt(format!("{context}: {err}"))
        } else {
            Self::Database(format!("{context}: {err}"))
        }
    }

    /// Like [`LedgerError::sqlite`], for failures while migrating.
    pub fn migration(context: &str, err: &rusqlite::Error) -> Self {
        if is_corruption(err) {
            Self::Corrupt(format!("{context}: {err}"))
        } else {
            Self::Migration(format!("{context}: {err}"))
        }
    }

    /// Whether the ledger file itself is damaged.
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }
}

fn is_corruption(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::NotADatabase | rusqlite::ErrorCode::DatabaseCorrupt)
    )
}

impl From<reqwest::Error> for DescribeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}
