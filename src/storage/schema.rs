//! Ledger schema definitions and migrations.

use rusqlite::Connection;

use crate::error::LedgerError;
use crate::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if migrations fail.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| LedgerError::migration("failed to create migrations table", &e))?;

    let current_version = get_current_version(conn)?;
    tracing::debug!(
        current = current_version,
        target = SCHEMA_VERSION,
        "Checking ledger migrations"
    );

    if current_version > SCHEMA_VERSION {
        return Err(LedgerError::Migration(format!(
            "ledger schema v{current_version} is newer than supported v{SCHEMA_VERSION}"
        ))
        .into());
    }

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> Result<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| LedgerError::migration("failed to get version", &e).into())
}

fn record_migration(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)",
        rusqlite::params![version, chrono::Utc::now().timestamp()],
    )
    .map_err(|e| LedgerError::migration("failed to record migration", &e))?;

    Ok(())
}

/// Migration v1: processed-file entries keyed by fingerprint.
fn migrate_v1(conn: &Connection) -> Result<()> {
    tracing::info!("Applying ledger migration v1");

    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS ledger_entries (
            key TEXT PRIMARY KEY,
            original_path TEXT NOT NULL,
            size INTEGER NOT NULL,
            mtime INTEGER NOT NULL,
            outcome TEXT NOT NULL,
            detail TEXT,
            attempts INTEGER NOT NULL DEFAULT 1,
            processed_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ledger_original_path ON ledger_entries(original_path);
        ",
    )
    .map_err(|e| LedgerError::migration("v1 failed", &e))?;

    record_migration(conn, 1)
}

/// Verify the expected tables exist.
///
/// # Errors
///
/// Returns [`LedgerError::Corrupt`] if a table is missing.
pub fn verify_schema(conn: &Connection) -> Result<()> {
    for table in ["schema_migrations", "ledger_entries"] {
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?",
                [table],
                |row| row.get(0),
            )
            .map_err(|e| LedgerError::migration("failed to inspect schema", &e))?;

        if !exists {
            return Err(LedgerError::Corrupt(format!("missing table '{table}'")).into());
        }
    }
    Ok(())
}
