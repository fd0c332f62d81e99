// Local ONNX binary classifier — malicious/benign over a single text.
//
// Wraps a two-class DistilBERT sentiment model repurposed as a
// malicious/benign detector: the NEGATIVE class is read as malicious.
// Runs entirely on the local CPU — no API calls, no network dependency.
//
// Expects `model.onnx` and `tokenizer.json` under `<model_dir>/binary/`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::traits::{BinaryClassifier, BinaryPrediction, BENIGN_LABEL, MALICIOUS_LABEL};

/// Class order in the model's output logits: [NEGATIVE, POSITIVE].
const NEGATIVE_IDX: usize = 0;

pub struct OnnxBinaryClassifier {
    // Arc+Mutex because:
    // 1. ort::Session::run takes &mut self, so we need interior mutability
    // 2. spawn_blocking requires 'static, so we need Arc for shared ownership
    // 3. The trait requires Send+Sync
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxBinaryClassifier {
    /// Load the model and tokenizer from `<model_dir>/binary/`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let dir = model_dir.join("binary");
        let model_path = dir.join("model.onnx");
        let tokenizer_path = dir.join("tokenizer.json");

        if !model_path.exists() || !tokenizer_path.exists() {
            anyhow::bail!(
                "Binary classifier files not found in {}\nRun `vigil download-model` first.",
                dir.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        debug!("Loaded binary classifier from {}", dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }
}

#[async_trait]
impl BinaryClassifier for OnnxBinaryClassifier {
    async fn classify(&self, text: &str) -> Result<BinaryPrediction> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let text = text.to_string();

        // Tokenization and inference are CPU-bound; run them off the async
        // runtime so request handling stays responsive.
        tokio::task::spawn_blocking(move || {
            let encoding = tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

            let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();
            let shape = [1_i64, ids.len() as i64];

            let input_ids = Tensor::from_array((shape, ids))
                .context("Failed to create input_ids tensor")?;
            let attention_mask = Tensor::from_array((shape, mask))
                .context("Failed to create attention_mask tensor")?;

            let logits = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids,
                        "attention_mask" => attention_mask
                    })
                    .context("ONNX inference failed")?;

                // Output shape: [1, 2] — raw logits [NEGATIVE, POSITIVE]
                let (_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;
                data.to_vec()
            };

            let probs = softmax(&logits);
            let (label, confidence) = if probs[NEGATIVE_IDX] >= probs[1 - NEGATIVE_IDX] {
                (MALICIOUS_LABEL, probs[NEGATIVE_IDX])
            } else {
                (BENIGN_LABEL, probs[1 - NEGATIVE_IDX])
            };

            debug!(label, confidence, "binary classifier scored text");

            Ok(BinaryPrediction {
                label: label.to_string(),
                confidence,
            })
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Softmax over a logit slice, in f64 for the downstream score math.
pub(crate) fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| ((l as f64) - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}
