//! `SQLite` connection for the ledger file.
//!
//! WAL mode keeps an interrupted flush from leaving a half-written ledger,
//! and a busy timeout lets a second process (`--ledger` next to a running
//! agent) wait for a flush instead of failing at once.

use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::LedgerError;
use crate::Result;

/// How long to wait for another connection's lock before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Ledger database connection, owned by a single ledger.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open a database at the given path.
    ///
    /// Creates the database file and parent directories if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Corrupt`] for files that are not `SQLite`
    /// databases, and another ledger error if the file is locked or cannot
    /// be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| LedgerError::sqlite("failed to open database", &e))?;

        let db = Self {
            conn,
            path: path.to_path_buf(),
        };
        db.configure()?;
        Ok(db)
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LedgerError::sqlite("failed to open in-memory database", &e))?;

        let db = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        db.configure()?;
        Ok(db)
    }

    fn configure(&self) -> Result<()> {
        self.conn
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| LedgerError::sqlite("failed to set busy timeout", &e))?;

        self.conn
            .execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA temp_store = MEMORY;
                ",
            )
            .map_err(|e| LedgerError::sqlite("failed to configure database", &e))?;

        tracing::debug!(path = %self.path.display(), "Database configured with WAL mode");
        Ok(())
    }

    /// Borrow the connection for reads and migrations.
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a function inside an immediate transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails or if the function fails;
    /// in the latter case nothing is committed.
    pub fn with_transaction<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| LedgerError::sqlite("failed to begin transaction", &e))?;

        // Dropping an uncommitted transaction rolls it back.
        let value = f(&tx)?;
        tx.commit()
            .map_err(|e| LedgerError::sqlite("failed to commit", &e))?;
        Ok(value)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
