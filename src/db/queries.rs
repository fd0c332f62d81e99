// Database queries — CRUD operations for the scan_results table.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{NewScan, ScanRecord, ScanSummary};

/// Insert a scan result and return the stored row (with its assigned id and
/// created_at).
pub fn insert_scan(conn: &Connection, scan: &NewScan) -> Result<ScanRecord> {
    conn.execute(
        "INSERT INTO scan_results
            (input_type, raw_name, content, is_malicious, threat_type,
             threat_score, binary_score, tokens)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            scan.input_type.as_str(),
            scan.raw_name,
            scan.content,
            scan.is_malicious,
            scan.threat_type,
            scan.threat_score,
            scan.binary_score,
            scan.tokens,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_scan(conn, id)?.context("Inserted scan row not found")
}

/// All scan summaries, newest first. No pagination — the admin dashboard
/// loads the full history.
pub fn list_scans(conn: &Connection) -> Result<Vec<ScanSummary>> {
    let mut stmt = conn.prepare(
        "SELECT id, input_type, raw_name, threat_type, is_malicious, created_at
         FROM scan_results
         ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(ScanSummary {
            id: row.get(0)?,
            input_type: row.get(1)?,
            raw_name: row.get(2)?,
            threat_type: row.get(3)?,
            is_malicious: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    let mut scans = Vec::new();
    for row in rows {
        scans.push(row?);
    }
    Ok(scans)
}

/// A single scan with full detail, or None if no row has that id.
pub fn get_scan(conn: &Connection, id: i64) -> Result<Option<ScanRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, input_type, raw_name, content, is_malicious, threat_type,
                threat_score, binary_score, tokens, created_at
         FROM scan_results
         WHERE id = ?1",
    )?;

    let result = stmt
        .query_row(params![id], |row| {
            Ok(ScanRecord {
                id: row.get(0)?,
                input_type: row.get(1)?,
                raw_name: row.get(2)?,
                content: row.get(3)?,
                is_malicious: row.get(4)?,
                threat_type: row.get(5)?,
                threat_score: row.get(6)?,
                binary_score: row.get(7)?,
                tokens: row.get(8)?,
                created_at: row.get(9)?,
            })
        })
        .optional()?;

    Ok(result)
}
