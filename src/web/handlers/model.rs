// Model admin handlers.
//
// GET  /model/status — the full status document (defaults if never initialized)
// POST /model/switch — change the active classification mode

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::model_status::ModelStatus;
use crate::web::error::ApiResult;
use crate::web::AppState;

/// GET /model/status — current mode and per-model metadata.
pub async fn get_status(State(state): State<AppState>) -> ApiResult<Json<ModelStatus>> {
    let status = state.status.read_status()?;
    Ok(Json(status))
}

#[derive(Deserialize)]
pub struct ModeSwitch {
    /// "hybrid", "binary-only", or "multi-only"
    pub mode: String,
}

/// POST /model/switch — switch the classification mode. 400 on anything
/// outside the three recognized values; the stored mode is left untouched.
pub async fn switch_mode(
    State(state): State<AppState>,
    Json(request): Json<ModeSwitch>,
) -> ApiResult<Json<Value>> {
    let mode = state.status.switch_mode(&request.mode)?;

    Ok(Json(json!({
        "message": format!("Switched to {mode} mode"),
    })))
}
