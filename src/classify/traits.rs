// Classifier traits — the swap-ready abstractions.
//
// Both inference models sit behind traits so the orchestrator never touches
// ort directly and tests can substitute fakes. The default implementations
// run local ONNX models.

use anyhow::Result;
use async_trait::async_trait;

/// Label emitted by the binary model for the malicious class.
pub const MALICIOUS_LABEL: &str = "NEGATIVE";

/// Label emitted by the binary model for the benign class.
pub const BENIGN_LABEL: &str = "POSITIVE";

/// The binary model's call on a single text.
#[derive(Debug, Clone)]
pub struct BinaryPrediction {
    /// NEGATIVE (malicious) or POSITIVE (benign)
    pub label: String,
    /// Confidence of the predicted label, 0.0 to 1.0
    pub confidence: f64,
}

impl BinaryPrediction {
    pub fn is_malicious(&self) -> bool {
        self.label == MALICIOUS_LABEL
    }
}

/// One candidate label with its zero-shot score.
#[derive(Debug, Clone)]
pub struct LabelScore {
    pub label: String,
    /// 0.0 to 1.0, normalized across the candidate set
    pub score: f64,
}

/// Two-class malicious/benign detector.
#[async_trait]
pub trait BinaryClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<BinaryPrediction>;
}

/// Zero-shot threat typing over a caller-supplied category list.
#[async_trait]
pub trait ThreatClassifier: Send + Sync {
    /// Score `text` against each candidate label. Returns the candidates
    /// ranked by score descending; scores sum to 1.0 across the set.
    async fn classify(&self, text: &str, labels: &[&str]) -> Result<Vec<LabelScore>>;
}
