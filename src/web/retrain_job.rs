// Background retraining job — runs the retraining orchestrator when
// triggered via POST /model/retrain.
//
// Training blocks for its full duration (potentially minutes), so it never
// runs inside a request handler. The submit route validates preconditions,
// flips the status to running, and spawns this job; callers poll
// GET /model/retrain/status to track progress.
//
// Only one job can run at a time; the submit route returns 409 if one is
// already active.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::training::{RetrainRequest, Retrainer, TrainingStats};

/// Live status of the background retraining job, exposed via
/// GET /model/retrain/status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainingJobStatus {
    /// True while a job is in progress.
    pub running: bool,
    /// Id of the current/last job.
    pub job_id: Option<String>,
    /// Dataset the current/last job trains on.
    pub dataset: Option<String>,
    /// ISO 8601 timestamp of when the current/last job started.
    pub started_at: Option<String>,
    /// Human-readable progress message.
    pub progress_message: String,
    /// Error message from the last job, if it failed.
    pub last_error: Option<String>,
    /// Metrics from the last completed job.
    pub last_stats: Option<TrainingStats>,
}

/// Launch the retraining job in a background tokio task.
/// Returns immediately. The caller has already marked the status running.
pub fn launch_retrain(
    retrainer: Arc<Retrainer>,
    request: RetrainRequest,
    job_status: Arc<RwLock<TrainingJobStatus>>,
) {
    tokio::spawn(async move {
        {
            let mut status = job_status.write().await;
            status.progress_message = format!("Retraining on {}…", request.dataset);
        }

        let result = retrainer.retrain(&request).await;

        let mut status = job_status.write().await;
        status.running = false;
        match result {
            Ok(stats) => {
                info!(dataset = %request.dataset, "retraining completed");
                status.last_error = None;
                status.progress_message = "Retraining completed successfully".to_string();
                status.last_stats = Some(stats);
            }
            Err(e) => {
                error!(error = %e, dataset = %request.dataset, "retraining failed");
                status.last_error = Some(e.to_string());
                status.progress_message = "Retraining failed — see server logs".to_string();
            }
        }
    });
}
