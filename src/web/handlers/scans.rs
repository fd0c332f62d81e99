// Scan history handlers.
//
// GET /scans      — all summaries, newest first, no pagination
// GET /scans/{id} — full detail including the stored content

use axum::extract::{Path, State};
use axum::Json;

use crate::db::models::{ScanRecord, ScanSummary};
use crate::web::error::{ApiError, ApiResult};
use crate::web::AppState;

/// GET /scans — scan summaries ordered newest first.
pub async fn list_scans(State(state): State<AppState>) -> ApiResult<Json<Vec<ScanSummary>>> {
    let scans = state.db.list_scans().await?;
    Ok(Json(scans))
}

/// GET /scans/{id} — single scan with full detail.
pub async fn get_scan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ScanRecord>> {
    match state.db.get_scan(id).await? {
        Some(scan) => Ok(Json(scan)),
        None => Err(ApiError::NotFound("Scan not found".to_string())),
    }
}
