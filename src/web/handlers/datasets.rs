// Dataset handlers — upload, list, and delete training CSVs.
//
// POST   /datasets            — multipart upload, silently overwrites
// GET    /datasets            — list with upload timestamps
// DELETE /datasets/{filename} — 404 when the file doesn't exist

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::datasets::DatasetEntry;
use crate::web::error::ApiResult;
use crate::web::AppState;

use super::read_upload;

/// POST /datasets — store an uploaded dataset file.
pub async fn upload_dataset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let (filename, bytes) = read_upload(&mut multipart).await?;
    state.datasets.save(&filename, &bytes)?;

    Ok(Json(json!({
        "message": "Dataset uploaded",
        "filename": filename,
    })))
}

/// GET /datasets — all stored datasets.
pub async fn list_datasets(State(state): State<AppState>) -> ApiResult<Json<Vec<DatasetEntry>>> {
    let entries = state.datasets.list()?;
    Ok(Json(entries))
}

/// DELETE /datasets/{filename} — remove a dataset.
pub async fn delete_dataset(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<Value>> {
    state.datasets.delete(&filename)?;

    Ok(Json(json!({
        "message": "Dataset deleted",
        "filename": filename,
    })))
}
