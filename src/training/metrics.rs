// Evaluation metrics and the training stats snapshot.
//
// Metrics are computed on the held-out validation split with the malicious
// class (1) as the positive class. The snapshot file keeps only the most
// recent run — it is overwritten on every retraining call.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One model's evaluation summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub last_trained: String,
}

/// The most recent retraining run's summary. Exactly one instance exists,
/// at the metrics snapshot path; no history is retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingStats {
    pub dataset_used: String,
    pub retrain_time: String,
    pub training_time_sec: Option<f64>,
    pub binary_model: Option<ModelMetrics>,
    pub multi_model: Option<ModelMetrics>,
}

impl TrainingStats {
    pub fn new(dataset: &str) -> Self {
        Self {
            dataset_used: dataset.to_string(),
            retrain_time: Utc::now().to_rfc3339(),
            training_time_sec: None,
            binary_model: None,
            multi_model: None,
        }
    }

    /// Overwrite the snapshot file with this run's stats.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory for {}", path.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Load the last snapshot, or None when no retraining has run yet.
    pub fn read_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let stats = serde_json::from_str(&json)
            .with_context(|| format!("Malformed stats snapshot at {}", path.display()))?;
        Ok(Some(stats))
    }
}

/// Accuracy, precision, recall, and F1 for the positive class, rounded to
/// four decimals. Degenerate denominators (no predicted or no actual
/// positives) score 0.0 rather than erroring.
pub fn evaluate(labels: &[u32], predictions: &[u32]) -> ModelMetrics {
    debug_assert_eq!(labels.len(), predictions.len());

    let mut tp = 0u32;
    let mut fp = 0u32;
    let mut tn = 0u32;
    let mut fn_ = 0u32;
    for (&label, &pred) in labels.iter().zip(predictions) {
        match (label, pred) {
            (1, 1) => tp += 1,
            (0, 1) => fp += 1,
            (0, 0) => tn += 1,
            _ => fn_ += 1,
        }
    }

    let total = labels.len() as f64;
    let accuracy = if total > 0.0 {
        f64::from(tp + tn) / total
    } else {
        0.0
    };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ModelMetrics {
        accuracy: round4(accuracy),
        precision: round4(precision),
        recall: round4(recall),
        f1_score: round4(f1),
        last_trained: Utc::now().to_rfc3339(),
    }
}

/// Fixed metrics for the unimplemented multi-class retraining path.
/// Fabricated — the dataset is never read. See DESIGN.md.
pub fn placeholder_multi_metrics() -> ModelMetrics {
    ModelMetrics {
        accuracy: 0.85,
        precision: 0.82,
        recall: 0.83,
        f1_score: 0.825,
        last_trained: Utc::now().to_rfc3339(),
    }
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        f64::from(num) / f64::from(den)
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_perfect_predictions() {
        let labels = [1, 0, 1, 0];
        let m = evaluate(&labels, &labels);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
    }

    #[test]
    fn test_evaluate_mixed_predictions() {
        // labels:      1 1 0 0
        // predictions: 1 0 1 0  → tp=1 fn=1 fp=1 tn=1
        let m = evaluate(&[1, 1, 0, 0], &[1, 0, 1, 0]);
        assert_eq!(m.accuracy, 0.5);
        assert_eq!(m.precision, 0.5);
        assert_eq!(m.recall, 0.5);
        assert_eq!(m.f1_score, 0.5);
    }

    #[test]
    fn test_evaluate_no_predicted_positives() {
        let m = evaluate(&[1, 1, 0], &[0, 0, 0]);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
    }

    #[test]
    fn test_evaluate_rounds_to_four_decimals() {
        // tp=1 fp=0 fn=2 → recall = 1/3
        let m = evaluate(&[1, 1, 1], &[1, 0, 0]);
        assert_eq!(m.recall, 0.3333);
    }

    #[test]
    fn test_placeholder_metrics_fixed_values() {
        let m = placeholder_multi_metrics();
        assert_eq!(m.accuracy, 0.85);
        assert_eq!(m.precision, 0.82);
        assert_eq!(m.recall, 0.83);
        assert_eq!(m.f1_score, 0.825);
    }

    #[test]
    fn test_stats_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training_stats.json");
        assert!(TrainingStats::read_from(&path).unwrap().is_none());

        let mut stats = TrainingStats::new("spam.csv");
        stats.multi_model = Some(placeholder_multi_metrics());
        stats.write_to(&path).unwrap();

        let loaded = TrainingStats::read_from(&path).unwrap().unwrap();
        assert_eq!(loaded.dataset_used, "spam.csv");
        assert_eq!(loaded.multi_model.unwrap().f1_score, 0.825);
        assert!(loaded.binary_model.is_none());
    }

    #[test]
    fn test_stats_snapshot_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training_stats.json");
        TrainingStats::new("first.csv").write_to(&path).unwrap();
        TrainingStats::new("second.csv").write_to(&path).unwrap();
        let loaded = TrainingStats::read_from(&path).unwrap().unwrap();
        assert_eq!(loaded.dataset_used, "second.csv");
    }
}
