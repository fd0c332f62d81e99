// Retraining handlers.
//
// POST /model/retrain        — validate and start the background job
// GET  /model/retrain/status — poll progress and the last run's metrics
//
// Submission returns 202 Accepted with a job id. Training never runs inside
// the request handler; see web/retrain_job.rs.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::training::RetrainRequest;
use crate::web::error::{ApiError, ApiResult};
use crate::web::retrain_job::{launch_retrain, TrainingJobStatus};
use crate::web::AppState;

/// POST /model/retrain — start a background retraining job.
pub async fn submit_retrain(
    State(state): State<AppState>,
    Json(request): Json<RetrainRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    // Reject bad requests before a job spawns: 404 for a missing dataset,
    // 500 for an absent status document, 400 for a bad filename.
    state.retrainer.check_preconditions(&request)?;

    if request.retrain_binary && !state.retrainer.backbone_present() {
        return Err(ApiError::Config(
            "Trainer backbone files not found — run `vigil download-model` first".to_string(),
        ));
    }

    let mut job = state.training_job.write().await;
    if job.running {
        return Err(ApiError::Conflict(
            "A retraining job is already running".to_string(),
        ));
    }

    let job_id = Uuid::new_v4().to_string();
    job.running = true;
    job.job_id = Some(job_id.clone());
    job.dataset = Some(request.dataset.clone());
    job.started_at = Some(Utc::now().to_rfc3339());
    job.progress_message = "Starting retraining…".to_string();
    job.last_error = None;
    drop(job);

    launch_retrain(
        state.retrainer.clone(),
        request,
        state.training_job.clone(),
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Retraining started",
            "job_id": job_id,
        })),
    ))
}

/// GET /model/retrain/status — live job status and last metrics.
pub async fn retrain_status(State(state): State<AppState>) -> Json<TrainingJobStatus> {
    let status = state.training_job.read().await;
    Json(status.clone())
}
