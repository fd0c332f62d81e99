// Database trait — async interface for scan persistence.
//
// All methods are async so the sync rusqlite backend (behind a Mutex) fits
// the same interface as any future native-async backend. Handlers depend on
// `Arc<dyn Database>` and never see a Connection.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{NewScan, ScanRecord, ScanSummary};

#[async_trait]
pub trait Database: Send + Sync {
    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    /// Insert a scan result and return the stored row.
    async fn record_scan(&self, scan: &NewScan) -> Result<ScanRecord>;

    /// All scan summaries (no content), newest first.
    async fn list_scans(&self) -> Result<Vec<ScanSummary>>;

    /// A single scan with full detail, or None if no row has that id.
    async fn get_scan(&self, id: i64) -> Result<Option<ScanRecord>>;
}
