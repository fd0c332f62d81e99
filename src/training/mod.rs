// Retraining — dataset-driven fine-tuning of the binary classifier plus the
// stubbed multi-class path.
//
// The orchestration mirrors the admin contract: preconditions are checked
// up front (dataset present, status document present), the binary path runs
// the real trainer, the multi path fabricates its fixed metrics, and both
// the status document and the stats snapshot are rewritten at the end even
// when only one flag was set.

pub mod data;
pub mod metrics;
pub mod trainer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::datasets::{DatasetError, DatasetStore};
use crate::model_status::StatusStore;

pub use metrics::{ModelMetrics, TrainingStats};

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),
    #[error("{0}")]
    InvalidDataset(String),
    #[error("Model status record not found — run `vigil init` before retraining")]
    MissingStatus,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<DatasetError> for TrainingError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::NotFound(name) => TrainingError::DatasetNotFound(name),
            DatasetError::InvalidName(name) => {
                TrainingError::InvalidDataset(format!("Invalid dataset filename: {name:?}"))
            }
            DatasetError::Other(e) => TrainingError::Other(e),
        }
    }
}

/// An admin retraining request.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrainRequest {
    pub dataset: String,
    pub retrain_binary: bool,
    pub retrain_multi: bool,
}

pub struct Retrainer {
    status: Arc<StatusStore>,
    datasets: Arc<DatasetStore>,
    /// Holds the trainer backbone and receives the trained head
    model_dir: PathBuf,
    /// The training_stats.json snapshot location
    metrics_path: PathBuf,
}

impl Retrainer {
    pub fn new(
        status: Arc<StatusStore>,
        datasets: Arc<DatasetStore>,
        model_dir: PathBuf,
        metrics_path: PathBuf,
    ) -> Self {
        Self {
            status,
            datasets,
            model_dir,
            metrics_path,
        }
    }

    /// Whether the trainer's DistilBERT backbone is on disk.
    pub fn backbone_present(&self) -> bool {
        crate::download::trainer_files_present(&self.model_dir)
    }

    /// Validate the request without starting any training. Used by the
    /// submit handler so a bad request is rejected before a job spawns.
    pub fn check_preconditions(&self, request: &RetrainRequest) -> Result<PathBuf, TrainingError> {
        let dataset_path = self.datasets.resolve(&request.dataset)?;
        if self.status.try_read_status()?.is_none() {
            // The retrain path never self-heals an absent status document.
            return Err(TrainingError::MissingStatus);
        }
        Ok(dataset_path)
    }

    /// Run the requested sub-trainings and rewrite the status document and
    /// stats snapshot. Blocks for the full training duration of the binary
    /// path — callers run this inside a background job.
    pub async fn retrain(&self, request: &RetrainRequest) -> Result<TrainingStats, TrainingError> {
        let dataset_path = self.check_preconditions(request)?;
        let mut stats = TrainingStats::new(&request.dataset);

        if request.retrain_binary {
            info!(dataset = %request.dataset, "retraining binary classifier");

            let examples = data::load_dataset(&dataset_path)?;
            let (train, validation) = data::train_val_split(examples, data::SPLIT_SEED);

            let backbone_dir = self.model_dir.join("distilbert-base-uncased");
            let model_dir = self.model_dir.clone();
            let started = Instant::now();
            let metrics = tokio::task::spawn_blocking(move || {
                trainer::fine_tune_binary(&backbone_dir, &model_dir, &train, &validation)
            })
            .await
            .context("training task panicked")??;

            stats.training_time_sec = Some((started.elapsed().as_secs_f64() * 100.0).round() / 100.0);
            stats.binary_model = Some(metrics);
        }

        if request.retrain_multi {
            // Multi-class retraining is a placeholder: no training happens
            // and the dataset is never read on this path.
            info!(dataset = %request.dataset, "recording multi-class placeholder metrics");
            stats.multi_model = Some(metrics::placeholder_multi_metrics());
        }

        // Fold the per-model metadata into the status document and overwrite
        // the snapshot, unconditionally.
        let binary = stats.binary_model.clone();
        let multi = stats.multi_model.clone();
        let dataset = request.dataset.clone();
        self.status.update_status(move |status| {
            if let Some(m) = &binary {
                status.binary_model.trained_on = dataset.clone();
                status.binary_model.last_updated = m.last_trained.clone();
            }
            if let Some(m) = &multi {
                status.multi_model.trained_on = dataset.clone();
                status.multi_model.last_updated = m.last_trained.clone();
            }
        })?;
        stats.write_to(&self.metrics_path)?;

        Ok(stats)
    }
}
