//! Persistent record of processed scan files.
//!
//! The ledger is loaded wholesale when the agent starts and written back in
//! one transaction at the end of every pass. A ledger file that is not a
//! database is moved aside and replaced by an empty one; losing it only costs
//! repeated describe calls. A ledger that is locked or otherwise unreadable
//! is left alone and attached again at the next flush.

use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::connection::Database;
use super::models::{LedgerEntry, Outcome};
use super::schema::{migrate, verify_schema};
use crate::error::LedgerError;
use crate::scan::ScanFile;
use crate::Result;

/// Failed files are retried until they have failed this many times.
pub const MAX_FAILED_ATTEMPTS: u32 = 3;

/// Fingerprint-keyed record of which files were already handled.
#[derive(Debug)]
pub struct ProcessedFileLedger {
    db: Option<Database>,
    /// Ledger file to attach when `db` is missing.
    path: Option<PathBuf>,
    entries: HashMap<String, LedgerEntry>,
    dirty: BTreeSet<String>,
}

impl ProcessedFileLedger {
    /// Load the ledger stored at `path`.
    ///
    /// Never fails. A file that is not a ledger database is logged, moved to
    /// `<path>-corrupt-<unix>` and replaced by an empty ledger. Any other
    /// failure (another process holding the lock, a newer schema, I/O) leaves
    /// the file untouched: the ledger starts empty and [`flush`] attaches the
    /// file again once it can be opened.
    ///
    /// [`flush`]: ProcessedFileLedger::flush
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        match open_and_read(path) {
            Ok((db, entries)) => {
                tracing::debug!(path = %path.display(), entries = entries.len(), "Ledger loaded");
                Self::with_entries(Some(db), Some(path), entries)
            }
            Err(e) if is_corrupt(&e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ledger corrupt, starting with an empty ledger"
                );
                quarantine(path);
                let db = open_and_read(path)
                    .map(|(db, _)| db)
                    .map_err(|e| {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Cannot recreate ledger, will retry when flushing"
                        );
                    })
                    .ok();
                Self::with_entries(db, Some(path), HashMap::new())
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ledger unavailable, leaving it in place and retrying when flushing"
                );
                Self::with_entries(None, Some(path), HashMap::new())
            }
        }
    }

    /// Ledger backed by an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        migrate(db.conn())?;
        Ok(Self::with_entries(Some(db), None, HashMap::new()))
    }

    fn with_entries(
        db: Option<Database>,
        path: Option<&Path>,
        entries: HashMap<String, LedgerEntry>,
    ) -> Self {
        Self {
            db,
            path: path.map(Path::to_path_buf),
            entries,
            dirty: BTreeSet::new(),
        }
    }

    /// Whether `file` needs no further processing.
    ///
    /// Renamed and skipped files are done. Failed files are done only after
    /// [`MAX_FAILED_ATTEMPTS`] failures.
    #[must_use]
    pub fn is_processed(&self, file: &ScanFile) -> bool {
        self.entry(file).is_some_and(|entry| {
            !entry.outcome.is_failure() || entry.attempts >= MAX_FAILED_ATTEMPTS
        })
    }

    /// Entry recorded for `file`, if any.
    #[must_use]
    pub fn entry(&self, file: &ScanFile) -> Option<&LedgerEntry> {
        self.entries.get(&file.fingerprint().key())
    }

    /// Record the outcome of processing `file`.
    pub fn record(&mut self, file: &ScanFile, outcome: Outcome) {
        let key = file.fingerprint().key();
        self.entries
            .entry(key.clone())
            .and_modify(|entry| entry.update(outcome.clone()))
            .or_insert_with(|| LedgerEntry::new(file, outcome));
        self.dirty.insert(key);
    }

    /// Write every entry recorded since the last flush.
    ///
    /// A ledger loaded without its file tries to attach it first, keeping
    /// the stored entries it did not record itself.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no backing database or the write fails.
    /// Recorded entries stay pending so a later flush can retry.
    pub fn flush(&mut self) -> Result<usize> {
        if self.dirty.is_empty() {
            return Ok(0);
        }

        if self.db.is_none() {
            self.attach()?;
        }
        let db = self
            .db
            .as_mut()
            .ok_or_else(|| LedgerError::Unavailable("no ledger database".to_string()))?;

        let pending: Vec<&LedgerEntry> = self
            .dirty
            .iter()
            .filter_map(|key| self.entries.get(key))
            .collect();

        db.with_transaction(|conn| {
            for entry in &pending {
                upsert_entry(conn, entry)?;
            }
            Ok(())
        })?;

        let written = pending.len();
        self.dirty.clear();
        tracing::debug!(entries = written, "Ledger flushed");
        Ok(written)
    }

    /// Whether the ledger is backed by a database.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.db.is_some()
    }

    fn attach(&mut self) -> Result<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| LedgerError::Unavailable("no ledger database".to_string()))?;

        let (db, stored) = open_and_read(path)?;
        tracing::info!(path = %path.display(), entries = stored.len(), "Ledger attached");
        for (key, entry) in stored {
            self.entries.entry(key).or_insert(entry);
        }
        self.db = Some(db);
        Ok(())
    }

    /// All entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.values()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn open_and_read(path: &Path) -> Result<(Database, HashMap<String, LedgerEntry>)> {
    let db = Database::open(path)?;
    migrate(db.conn())?;
    verify_schema(db.conn())?;
    let entries = load_entries(db.conn())?;
    Ok((db, entries))
}

fn is_corrupt(err: &crate::Error) -> bool {
    matches!(err, crate::Error::Ledger(e) if e.is_corrupt())
}

fn load_entries(conn: &Connection) -> Result<HashMap<String, LedgerEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT key, original_path, size, mtime, outcome, detail, attempts, processed_at
             FROM ledger_entries",
        )
        .map_err(|e| LedgerError::sqlite("failed to read ledger", &e))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                LedgerEntry {
                    key: row.get(0)?,
                    original_path: row.get(1)?,
                    size: row.get(2)?,
                    mtime: row.get(3)?,
                    outcome: Outcome::skipped(""),
                    attempts: row.get(6)?,
                    processed_at: row.get(7)?,
                },
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })
        .map_err(|e| LedgerError::sqlite("failed to read ledger", &e))?;

    let mut entries = HashMap::new();
    for row in rows {
        let (mut entry, kind, detail) = row.map_err(|e| LedgerError::sqlite("failed to read ledger entry", &e))?;
        let Some(outcome) = Outcome::from_columns(&kind, detail) else {
            tracing::warn!(key = %entry.key, outcome = %kind, "Ignoring ledger entry with unknown outcome");
            continue;
        };
        entry.outcome = outcome;
        entries.insert(entry.key.clone(), entry);
    }
    Ok(entries)
}

fn upsert_entry(conn: &Connection, entry: &LedgerEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO ledger_entries
            (key, original_path, size, mtime, outcome, detail, attempts, processed_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
            outcome = excluded.outcome,
            detail = excluded.detail,
            attempts = excluded.attempts,
            processed_at = excluded.processed_at",
        rusqlite::params![
            entry.key,
            entry.original_path,
            entry.size,
            entry.mtime,
            entry.outcome.kind(),
            entry.outcome.detail(),
            entry.attempts,
            entry.processed_at,
        ],
    )
    .map_err(|e| LedgerError::sqlite("failed to write ledger entry", &e))?;
    Ok(())
}

/// Move a corrupt ledger (and its WAL files) out of the way.
fn quarantine(path: &Path) {
    if !path.exists() {
        return;
    }

    let suffix = format!("corrupt-{}", chrono::Utc::now().timestamp());
    let target = sibling(path, &suffix);
    match std::fs::rename(path, &target) {
        Ok(()) => tracing::warn!(moved_to = %target.display(), "Moved corrupt ledger aside"),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot move corrupt ledger, removing it");
            let _ = std::fs::remove_file(path);
        }
    }

    for ext in ["wal", "shm"] {
        let _ = std::fs::remove_file(sibling(path, ext));
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!("-{suffix}"));
    path.with_file_name(name)
}
