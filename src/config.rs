use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Central configuration loaded from environment variables.
///
/// Everything has a default so `vigil serve` works out of the box. The .env
/// file is loaded automatically at startup via dotenvy.
pub struct Config {
    /// SQLite database file holding scan results
    pub db_path: String,
    /// Directory for mutable server data: uploaded datasets, the model
    /// status document, and the last training stats snapshot
    pub data_dir: PathBuf,
    /// Directory containing the ONNX inference models and the trainer's
    /// DistilBERT backbone
    pub model_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("VIGIL_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::download::default_model_dir());

        Ok(Self {
            db_path: env::var("VIGIL_DB_PATH").unwrap_or_else(|_| "./vigil.db".to_string()),
            data_dir: env::var("VIGIL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            model_dir,
        })
    }

    /// Directory holding uploaded CSV datasets.
    pub fn dataset_dir(&self) -> PathBuf {
        self.data_dir.join("datasets")
    }

    /// The model status document (mode + per-model metadata).
    pub fn status_path(&self) -> PathBuf {
        self.data_dir.join("model_status.json")
    }

    /// The last training run's stats snapshot.
    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join("training_stats.json")
    }

    /// Check that both inference models are downloaded.
    /// Call this before starting the server.
    pub fn require_models(&self) -> Result<()> {
        if !crate::download::inference_files_present(&self.model_dir) {
            anyhow::bail!(
                "Classifier model files not found in {}\n\
                 Run `vigil download-model` to download them.",
                self.model_dir.display()
            );
        }
        Ok(())
    }

    /// Check that the trainer's DistilBERT backbone is downloaded.
    /// Call this before accepting a retraining job.
    pub fn require_trainer(&self) -> Result<()> {
        if !crate::download::trainer_files_present(&self.model_dir) {
            anyhow::bail!(
                "Trainer backbone files not found in {}\n\
                 Run `vigil download-model` to download them.",
                self.model_dir.display()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths_live_under_data_dir() {
        let config = Config {
            db_path: "./vigil.db".to_string(),
            data_dir: PathBuf::from("/tmp/vigil-data"),
            model_dir: PathBuf::from("/tmp/vigil-models"),
        };
        assert_eq!(config.dataset_dir(), PathBuf::from("/tmp/vigil-data/datasets"));
        assert_eq!(
            config.status_path(),
            PathBuf::from("/tmp/vigil-data/model_status.json")
        );
        assert_eq!(
            config.metrics_path(),
            PathBuf::from("/tmp/vigil-data/training_stats.json")
        );
    }
}
