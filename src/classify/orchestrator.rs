// Classification orchestrator — mode dispatch over the two model adapters.
//
// Reads the active mode from the status store on every call, invokes one or
// both classifiers, and merges their outputs into a single result. The two
// signals are independent and never reconciled: in hybrid mode the binary
// model can flag a text malicious while the zero-shot model names "safe" as
// the closest category, and both are reported as-is.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::model_status::{Mode, StatusStore};

use super::traits::{BinaryClassifier, ThreatClassifier};

/// Threat categories scored by the zero-shot classifier.
pub const CATEGORIES: [&str; 4] = ["phishing", "HTML injection", "malware", "safe"];

/// Reported when the zero-shot classifier didn't run (binary-only mode).
pub const UNKNOWN_THREAT: &str = "unknown";

/// Keywords surfaced as "highlighted tokens" alongside every result. Matched
/// case-insensitively as substrings; output order follows this list, not the
/// input text.
pub const HIGHLIGHT_KEYWORDS: [&str; 5] = ["account", "verify", "login", "click", "script"];

/// The merged classification of a single text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_malicious: bool,
    /// Confidence (0-100) of the malicious/benign call; None when the binary
    /// model didn't run (multi-only mode)
    pub binary_score: Option<f64>,
    /// Top zero-shot category, or "unknown" in binary-only mode
    pub threat_type: String,
    /// Confidence (0-100) of threat_type; 0.0 when not computed
    pub threat_score: f64,
    pub highlighted_tokens: Vec<String>,
}

pub struct Orchestrator {
    status: Arc<StatusStore>,
    binary: Arc<dyn BinaryClassifier>,
    multi: Arc<dyn ThreatClassifier>,
}

impl Orchestrator {
    pub fn new(
        status: Arc<StatusStore>,
        binary: Arc<dyn BinaryClassifier>,
        multi: Arc<dyn ThreatClassifier>,
    ) -> Self {
        Self {
            status,
            binary,
            multi,
        }
    }

    /// Classify a text under the currently stored mode.
    ///
    /// Classifier errors propagate to the caller; there are no retries or
    /// timeouts around the model calls.
    pub async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let mode = self.status.get_mode()?;
        tracing::debug!(%mode, "running classification");

        let result = match mode {
            Mode::BinaryOnly => {
                let prediction = self.binary.classify(text).await?;
                ClassificationResult {
                    is_malicious: prediction.is_malicious(),
                    binary_score: Some(to_percent(prediction.confidence)),
                    threat_type: UNKNOWN_THREAT.to_string(),
                    threat_score: 0.0,
                    highlighted_tokens: highlighted_tokens(text),
                }
            }
            Mode::MultiOnly => {
                let ranked = self.multi.classify(text, &CATEGORIES).await?;
                let top = ranked
                    .first()
                    .ok_or_else(|| anyhow::anyhow!("zero-shot classifier returned no labels"))?;
                ClassificationResult {
                    // A threat-type prediction is always treated as a positive
                    // detection in this mode.
                    is_malicious: true,
                    binary_score: None,
                    threat_type: top.label.clone(),
                    threat_score: to_percent(top.score),
                    highlighted_tokens: highlighted_tokens(text),
                }
            }
            Mode::Hybrid => {
                let prediction = self.binary.classify(text).await?;
                let ranked = self.multi.classify(text, &CATEGORIES).await?;
                let top = ranked
                    .first()
                    .ok_or_else(|| anyhow::anyhow!("zero-shot classifier returned no labels"))?;
                ClassificationResult {
                    is_malicious: prediction.is_malicious(),
                    binary_score: Some(to_percent(prediction.confidence)),
                    threat_type: top.label.clone(),
                    threat_score: to_percent(top.score),
                    highlighted_tokens: highlighted_tokens(text),
                }
            }
        };

        Ok(result)
    }
}

/// Convert a 0-1 confidence to a 0-100 score rounded to two decimals.
pub fn to_percent(confidence: f64) -> f64 {
    (confidence * 100.0 * 100.0).round() / 100.0
}

/// Case-insensitive substring matches against the fixed keyword list,
/// preserving the list's order regardless of word order in the text.
pub fn highlighted_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    for keyword in HIGHLIGHT_KEYWORDS {
        if lower.contains(keyword) {
            tokens.push(keyword.to_string());
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_percent_rounds_to_two_decimals() {
        assert_eq!(to_percent(0.987654), 98.77);
        assert_eq!(to_percent(0.5), 50.0);
        assert_eq!(to_percent(1.0), 100.0);
        assert_eq!(to_percent(0.0), 0.0);
    }

    #[test]
    fn test_highlighted_tokens_fixed_order() {
        // List order wins over word order in the text
        let tokens = highlighted_tokens("Click here to verify your account");
        assert_eq!(tokens, vec!["account", "verify", "click"]);
    }

    #[test]
    fn test_highlighted_tokens_case_insensitive() {
        let tokens = highlighted_tokens("LOGIN NOW and CLICK");
        assert_eq!(tokens, vec!["login", "click"]);
    }

    #[test]
    fn test_highlighted_tokens_substring_matches() {
        // "subscript" contains "script" — substring semantics, not word match
        let tokens = highlighted_tokens("see the subscript below");
        assert_eq!(tokens, vec!["script"]);
    }

    #[test]
    fn test_highlighted_tokens_empty_for_clean_text() {
        assert!(highlighted_tokens("nothing suspicious here").is_empty());
    }
}
