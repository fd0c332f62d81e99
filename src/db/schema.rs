// Database schema — table creation and migrations.
//
// We use a simple version-based migration approach: a `schema_version` table
// tracks which migrations have run, and each migration is a function that
// executes SQL statements.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Classification results, one row per scan request.
        -- Rows are append-only: nothing in the system updates or deletes them.
        CREATE TABLE IF NOT EXISTS scan_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            input_type TEXT NOT NULL,          -- 'url', 'email', or 'html'
            raw_name TEXT NOT NULL,            -- uploaded filename or fixed literal
            content TEXT NOT NULL,             -- truncated input text
            is_malicious INTEGER NOT NULL,
            threat_type TEXT NOT NULL,         -- zero-shot category or 'unknown'
            threat_score REAL NOT NULL,        -- 0.0 to 100.0
            binary_score REAL,                 -- 0.0 to 100.0, NULL in multi-only mode
            tokens TEXT NOT NULL,              -- comma-joined highlighted keywords
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Index for the history listing (newest first)
        CREATE INDEX IF NOT EXISTS idx_scans_created
            ON scan_results(created_at);

        -- Index for filtering by input type
        CREATE INDEX IF NOT EXISTS idx_scans_input_type
            ON scan_results(input_type);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        // Running create_tables twice should not error
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let count = table_count(&conn).unwrap();
        // schema_version, scan_results = 2 tables
        assert_eq!(count, 2i64);
    }
}
