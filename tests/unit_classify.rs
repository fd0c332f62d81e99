// Orchestrator behavior across the three classification modes.
//
// Uses fake classifier adapters so the mode dispatch and merge logic are
// tested without model files. The fakes also prove which adapters each mode
// invokes: a mode that must not touch an adapter gets a failing fake, and
// the call succeeding shows the adapter was never consulted.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use vigil::classify::traits::{
    BinaryClassifier, BinaryPrediction, LabelScore, ThreatClassifier,
};
use vigil::classify::{Orchestrator, CATEGORIES};
use vigil::model_status::StatusStore;

// --- Fakes ---

/// Fixed-output binary classifier.
struct FakeBinary {
    label: &'static str,
    confidence: f64,
}

#[async_trait]
impl BinaryClassifier for FakeBinary {
    async fn classify(&self, _text: &str) -> Result<BinaryPrediction> {
        Ok(BinaryPrediction {
            label: self.label.to_string(),
            confidence: self.confidence,
        })
    }
}

/// Binary classifier that must never be called.
struct UnreachableBinary;

#[async_trait]
impl BinaryClassifier for UnreachableBinary {
    async fn classify(&self, _text: &str) -> Result<BinaryPrediction> {
        anyhow::bail!("binary classifier must not run in this mode")
    }
}

/// Zero-shot classifier that ranks a fixed label first.
struct FakeMulti {
    top_label: &'static str,
    top_score: f64,
}

#[async_trait]
impl ThreatClassifier for FakeMulti {
    async fn classify(&self, _text: &str, labels: &[&str]) -> Result<Vec<LabelScore>> {
        let rest_score = (1.0 - self.top_score) / (labels.len() - 1) as f64;
        let mut ranked = vec![LabelScore {
            label: self.top_label.to_string(),
            score: self.top_score,
        }];
        for &label in labels.iter().filter(|&&l| l != self.top_label) {
            ranked.push(LabelScore {
                label: label.to_string(),
                score: rest_score,
            });
        }
        Ok(ranked)
    }
}

/// Zero-shot classifier that must never be called.
struct UnreachableMulti;

#[async_trait]
impl ThreatClassifier for UnreachableMulti {
    async fn classify(&self, _text: &str, _labels: &[&str]) -> Result<Vec<LabelScore>> {
        anyhow::bail!("zero-shot classifier must not run in this mode")
    }
}

// --- Fixture ---

struct Fixture {
    _dir: tempfile::TempDir,
    status: Arc<StatusStore>,
}

fn fixture(mode: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let status = Arc::new(StatusStore::new(dir.path().join("model_status.json")));
    status.init().unwrap();
    status.switch_mode(mode).unwrap();
    Fixture { _dir: dir, status }
}

fn orchestrator(
    fx: &Fixture,
    binary: impl BinaryClassifier + 'static,
    multi: impl ThreatClassifier + 'static,
) -> Orchestrator {
    Orchestrator::new(Arc::clone(&fx.status), Arc::new(binary), Arc::new(multi))
}

// --- binary-only mode ---

#[tokio::test]
async fn binary_only_reports_unknown_threat() {
    let fx = fixture("binary-only");
    let orch = orchestrator(
        &fx,
        FakeBinary {
            label: "NEGATIVE",
            confidence: 0.987654,
        },
        UnreachableMulti,
    );

    let result = orch.classify("free money, click now").await.unwrap();
    assert!(result.is_malicious);
    assert_eq!(result.binary_score, Some(98.77));
    assert_eq!(result.threat_type, "unknown");
    assert_eq!(result.threat_score, 0.0);
}

#[tokio::test]
async fn binary_only_benign_prediction() {
    let fx = fixture("binary-only");
    let orch = orchestrator(
        &fx,
        FakeBinary {
            label: "POSITIVE",
            confidence: 0.6,
        },
        UnreachableMulti,
    );

    let result = orch.classify("weekly newsletter").await.unwrap();
    assert!(!result.is_malicious);
    assert_eq!(result.binary_score, Some(60.0));
    assert_eq!(result.threat_type, "unknown");
    assert_eq!(result.threat_score, 0.0);
}

// --- multi-only mode ---

#[tokio::test]
async fn multi_only_is_always_malicious_with_null_binary_score() {
    let fx = fixture("multi-only");
    let orch = orchestrator(
        &fx,
        UnreachableBinary,
        FakeMulti {
            top_label: "safe",
            top_score: 0.9,
        },
    );

    // Even a "safe" top category is reported as a positive detection in
    // this mode.
    let result = orch.classify("hello world").await.unwrap();
    assert!(result.is_malicious);
    assert_eq!(result.binary_score, None);
    assert_eq!(result.threat_type, "safe");
    assert_eq!(result.threat_score, 90.0);
}

#[tokio::test]
async fn multi_only_reports_top_ranked_category() {
    let fx = fixture("multi-only");
    let orch = orchestrator(
        &fx,
        UnreachableBinary,
        FakeMulti {
            top_label: "phishing",
            top_score: 0.755555,
        },
    );

    let result = orch.classify("verify your account").await.unwrap();
    assert_eq!(result.threat_type, "phishing");
    assert_eq!(result.threat_score, 75.56);
}

// --- hybrid mode ---

#[tokio::test]
async fn hybrid_is_the_concatenation_of_both_modes() {
    let binary = || FakeBinary {
        label: "NEGATIVE",
        confidence: 0.91,
    };
    let multi = || FakeMulti {
        top_label: "malware",
        top_score: 0.67,
    };
    let text = "click to download the attachment";

    let fx = fixture("binary-only");
    let binary_result = orchestrator(&fx, binary(), UnreachableMulti)
        .classify(text)
        .await
        .unwrap();

    let fx = fixture("multi-only");
    let multi_result = orchestrator(&fx, UnreachableBinary, multi())
        .classify(text)
        .await
        .unwrap();

    let fx = fixture("hybrid");
    let hybrid = orchestrator(&fx, binary(), multi())
        .classify(text)
        .await
        .unwrap();

    // Binary half matches binary-only exactly
    assert_eq!(hybrid.is_malicious, binary_result.is_malicious);
    assert_eq!(hybrid.binary_score, binary_result.binary_score);
    // Zero-shot half matches multi-only exactly
    assert_eq!(hybrid.threat_type, multi_result.threat_type);
    assert_eq!(hybrid.threat_score, multi_result.threat_score);
}

#[tokio::test]
async fn hybrid_signals_are_never_reconciled() {
    // Binary says benign while the zero-shot model names phishing — both
    // are reported as-is.
    let fx = fixture("hybrid");
    let orch = orchestrator(
        &fx,
        FakeBinary {
            label: "POSITIVE",
            confidence: 0.8,
        },
        FakeMulti {
            top_label: "phishing",
            top_score: 0.95,
        },
    );

    let result = orch.classify("login to continue").await.unwrap();
    assert!(!result.is_malicious);
    assert_eq!(result.threat_type, "phishing");
    assert_eq!(result.threat_score, 95.0);
}

#[tokio::test]
async fn hybrid_is_the_default_for_fresh_stores() {
    // A store that was never initialized or switched classifies in hybrid
    // mode — both adapters must run.
    let dir = tempfile::tempdir().unwrap();
    let status = Arc::new(StatusStore::new(dir.path().join("model_status.json")));
    let orch = Orchestrator::new(
        status,
        Arc::new(FakeBinary {
            label: "NEGATIVE",
            confidence: 0.5,
        }),
        Arc::new(FakeMulti {
            top_label: "malware",
            top_score: 0.4,
        }),
    );

    let result = orch.classify("anything").await.unwrap();
    assert_eq!(result.binary_score, Some(50.0));
    assert_eq!(result.threat_type, "malware");
}

// --- highlighted tokens (mode-independent) ---

#[tokio::test]
async fn highlighted_tokens_keep_fixed_list_order() {
    let fx = fixture("binary-only");
    let orch = orchestrator(
        &fx,
        FakeBinary {
            label: "NEGATIVE",
            confidence: 1.0,
        },
        UnreachableMulti,
    );

    let result = orch
        .classify("Click here to verify your account")
        .await
        .unwrap();
    assert_eq!(result.highlighted_tokens, vec!["account", "verify", "click"]);
}

#[tokio::test]
async fn highlighted_tokens_are_a_subsequence_of_the_keyword_list() {
    let fx = fixture("multi-only");
    let orch = orchestrator(
        &fx,
        UnreachableBinary,
        FakeMulti {
            top_label: "HTML injection",
            top_score: 0.5,
        },
    );

    let full = ["account", "verify", "login", "click", "script"];
    let result = orch
        .classify("<script>steal()</script> LOGIN at this page")
        .await
        .unwrap();

    // Every match appears in list order
    let mut cursor = 0;
    for token in &result.highlighted_tokens {
        let position = full[cursor..]
            .iter()
            .position(|k| k == token)
            .expect("token outside the fixed keyword list or out of order");
        cursor += position + 1;
    }
    assert_eq!(result.highlighted_tokens, vec!["login", "script"]);
}

#[test]
fn category_list_matches_the_fixed_set() {
    assert_eq!(CATEGORIES, ["phishing", "HTML injection", "malware", "safe"]);
}
