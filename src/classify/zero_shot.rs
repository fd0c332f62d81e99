// Local ONNX zero-shot threat classifier.
//
// Zero-shot classification via natural language inference: each candidate
// label becomes the hypothesis "This example is {label}." paired with the
// input text as premise. The model scores entailment per pair, and the
// entailment logits are softmaxed across the candidate set so the scores
// form a distribution over labels.
//
// Expects `model.onnx` and `tokenizer.json` under `<model_dir>/nli/`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::binary::softmax;
use super::traits::{LabelScore, ThreatClassifier};

/// Model output order: [entailment, neutral, contradiction].
const ENTAILMENT_IDX: usize = 0;

/// NLI models score 3 classes per premise/hypothesis pair.
const NLI_CLASSES: usize = 3;

/// Hypothesis template for zero-shot NLI classification.
const HYPOTHESIS_TEMPLATE: &str = "This example is {}.";

pub struct OnnxThreatClassifier {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxThreatClassifier {
    /// Load the model and tokenizer from `<model_dir>/nli/`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let dir = model_dir.join("nli");
        let model_path = dir.join("model.onnx");
        let tokenizer_path = dir.join("tokenizer.json");

        if !model_path.exists() || !tokenizer_path.exists() {
            anyhow::bail!(
                "Zero-shot classifier files not found in {}\nRun `vigil download-model` first.",
                dir.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        debug!("Loaded zero-shot classifier from {}", dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }
}

#[async_trait]
impl ThreatClassifier for OnnxThreatClassifier {
    async fn classify(&self, text: &str, labels: &[&str]) -> Result<Vec<LabelScore>> {
        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let premise = text.to_string();
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();

        tokio::task::spawn_blocking(move || {
            // One premise/hypothesis pair per candidate label, run as a
            // single batch.
            let encodings: Vec<_> = labels
                .iter()
                .map(|label| {
                    let hypothesis = HYPOTHESIS_TEMPLATE.replace("{}", label);
                    tokenizer
                        .encode((premise.clone(), hypothesis), true)
                        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
                })
                .collect::<Result<Vec<_>>>()?;

            let batch_size = encodings.len();
            let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

            // Flat input tensors with right-padding to max_len.
            // Shape: [batch_size, max_len]
            let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
            let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

            for enc in &encodings {
                let ids = enc.get_ids();
                let mask = enc.get_attention_mask();
                let seq_len = ids.len();

                for &id in ids {
                    input_ids_flat.push(id as i64);
                }
                for &m in mask {
                    attention_mask_flat.push(m as i64);
                }

                // Pad to max_len (pad token id 0 for DistilBERT)
                for _ in seq_len..max_len {
                    input_ids_flat.push(0);
                    attention_mask_flat.push(0);
                }
            }

            let shape = [batch_size as i64, max_len as i64];

            let input_ids = Tensor::from_array((shape, input_ids_flat))
                .context("Failed to create input_ids tensor")?;
            let attention_mask = Tensor::from_array((shape, attention_mask_flat))
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

                // Output shape: [batch_size, 3] — NLI logits per pair
                let (_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;
                data.to_vec()
            };

            // Entailment logit per label, softmaxed across the candidate set.
            let entailment: Vec<f32> = (0..batch_size)
                .map(|i| logits[i * NLI_CLASSES + ENTAILMENT_IDX])
                .collect();
            let scores = softmax(&entailment);

            let mut ranked: Vec<LabelScore> = labels
                .into_iter()
                .zip(scores)
                .map(|(label, score)| LabelScore { label, score })
                .collect();
            ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

            if let Some(top) = ranked.first() {
                debug!(label = %top.label, score = top.score, "zero-shot top label");
            }

            Ok(ranked)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}
