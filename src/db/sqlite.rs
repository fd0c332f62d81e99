// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points — Rust enforces this because
// MutexGuard is !Send.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{NewScan, ScanRecord, ScanSummary};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn record_scan(&self, scan: &NewScan) -> Result<ScanRecord> {
        let conn = self.conn.lock().await;
        super::queries::insert_scan(&conn, scan)
    }

    async fn list_scans(&self) -> Result<Vec<ScanSummary>> {
        let conn = self.conn.lock().await;
        super::queries::list_scans(&conn)
    }

    async fn get_scan(&self, id: i64) -> Result<Option<ScanRecord>> {
        let conn = self.conn.lock().await;
        super::queries::get_scan(&conn, id)
    }
}
