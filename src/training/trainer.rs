// Binary classifier fine-tuning on top of a pre-trained DistilBERT backbone.
//
// The backbone weights are mmapped read-only and stay frozen; the trainable
// part is a two-layer classification head (pre_classifier → ReLU →
// classifier), registered in a VarMap so candle's AdamW can step it.
// Hyperparameters are fixed: 2 epochs, batch size 8, no checkpointing.
//
// The trained head is written to `binary_head.safetensors` in the model
// directory. The serving ONNX adapter is not reloaded from it — training
// produces an offline artifact plus the validation metrics reported to the
// caller.

use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, AdamW, Linear, Module, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::data::LabeledExample;
use super::metrics::{evaluate, ModelMetrics};

/// Fixed fine-tuning hyperparameters.
pub const EPOCHS: usize = 2;
pub const BATCH_SIZE: usize = 8;
pub const LEARNING_RATE: f64 = 5e-5;
pub const MAX_SEQ_LEN: usize = 256;

/// Filename of the trained head inside the model directory.
pub const HEAD_FILE: &str = "binary_head.safetensors";

/// Fine-tune the classification head and evaluate on the validation split.
///
/// `backbone_dir` must contain `model.safetensors`, `config.json`, and
/// `tokenizer.json` for the DistilBERT backbone. Blocking and CPU-bound —
/// callers dispatch this through spawn_blocking.
pub fn fine_tune_binary(
    backbone_dir: &Path,
    model_dir: &Path,
    train: &[LabeledExample],
    validation: &[LabeledExample],
) -> Result<ModelMetrics> {
    let weights_path = backbone_dir.join("model.safetensors");
    let config_path = backbone_dir.join("config.json");
    let tokenizer_path = backbone_dir.join("tokenizer.json");
    for path in [&weights_path, &config_path, &tokenizer_path] {
        if !path.exists() {
            anyhow::bail!(
                "Trainer backbone file missing: {}\nRun `vigil download-model` first.",
                path.display()
            );
        }
    }

    let device = Device::Cpu;

    let config_json = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config: DistilBertConfig =
        serde_json::from_str(&config_json).context("Malformed DistilBERT config.json")?;
    // `DistilBertConfig::dim` is not publicly readable, so recover the hidden
    // dimension from the same config.json field the struct deserializes from.
    let config_dim: usize = serde_json::from_str::<serde_json::Value>(&config_json)
        .ok()
        .and_then(|v| v.get("dim").and_then(|d| d.as_u64()))
        .map(|d| d as usize)
        .context("Malformed DistilBERT config.json")?;

    let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
    tokenizer
        .with_truncation(Some(tokenizers::TruncationParams {
            max_length: MAX_SEQ_LEN,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

    // Frozen backbone from the pre-trained checkpoint.
    let backbone_vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
            .context("Failed to load backbone weights")?
    };
    let backbone = DistilBertModel::load(backbone_vb, &config)
        .context("Failed to build DistilBERT backbone")?;

    // Trainable head, registered in the VarMap for the optimizer.
    let varmap = VarMap::new();
    let head_vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let pre_classifier: Linear =
        linear(config_dim, config_dim, head_vb.pp("pre_classifier")).context("head init")?;
    let classifier: Linear = linear(config_dim, 2, head_vb.pp("classifier")).context("head init")?;

    let mut optimizer = AdamW::new(
        varmap.all_vars(),
        ParamsAdamW {
            lr: LEARNING_RATE,
            ..Default::default()
        },
    )?;

    info!(
        train = train.len(),
        validation = validation.len(),
        epochs = EPOCHS,
        batch_size = BATCH_SIZE,
        "starting binary fine-tune"
    );

    for epoch in 0..EPOCHS {
        let mut epoch_loss = 0.0;
        let mut batches = 0usize;

        for chunk in train.chunks(BATCH_SIZE) {
            let batch = encode_batch(&tokenizer, chunk, &device)?;
            let cls = forward_backbone(&backbone, &batch)?;
            // The backbone is frozen — cut the graph here so gradients only
            // reach the head vars.
            let cls = cls.detach();

            let hidden = pre_classifier.forward(&cls)?.relu()?;
            let logits = classifier.forward(&hidden)?;

            let labels: Vec<u32> = chunk.iter().map(|e| e.label).collect();
            let labels = Tensor::from_vec(labels, (chunk.len(),), &device)?;
            let loss = candle_nn::loss::cross_entropy(&logits, &labels)?;
            optimizer.backward_step(&loss)?;

            epoch_loss += loss.to_scalar::<f32>()? as f64;
            batches += 1;
        }

        debug!(
            epoch,
            mean_loss = epoch_loss / batches.max(1) as f64,
            "epoch complete"
        );
    }

    // Evaluate on the held-out split.
    let mut predictions = Vec::with_capacity(validation.len());
    for chunk in validation.chunks(BATCH_SIZE) {
        let batch = encode_batch(&tokenizer, chunk, &device)?;
        let cls = forward_backbone(&backbone, &batch)?.detach();
        let hidden = pre_classifier.forward(&cls)?.relu()?;
        let logits = classifier.forward(&hidden)?;
        let batch_preds = logits.argmax(candle_core::D::Minus1)?.to_vec1::<u32>()?;
        predictions.extend(batch_preds);
    }
    let labels: Vec<u32> = validation.iter().map(|e| e.label).collect();
    let metrics = evaluate(&labels, &predictions);

    // No checkpointing during training — just the final head.
    let head_path = model_dir.join(HEAD_FILE);
    varmap
        .save(&head_path)
        .with_context(|| format!("Failed to save trained head to {}", head_path.display()))?;

    info!(
        accuracy = metrics.accuracy,
        f1 = metrics.f1_score,
        head = %head_path.display(),
        "fine-tune complete"
    );

    Ok(metrics)
}

struct EncodedBatch {
    input_ids: Tensor,
    attention_mask: Tensor,
}

/// Tokenize a chunk of examples into right-padded batch tensors.
fn encode_batch(
    tokenizer: &Tokenizer,
    chunk: &[LabeledExample],
    device: &Device,
) -> Result<EncodedBatch> {
    let mut ids = Vec::with_capacity(chunk.len());
    let mut masks = Vec::with_capacity(chunk.len());
    for example in chunk {
        let encoding = tokenizer
            .encode(example.text.as_str(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;
        ids.push(encoding.get_ids().to_vec());
        masks.push(encoding.get_attention_mask().to_vec());
    }

    let (ids_flat, pad_flat, max_len) = pad_batch(&ids, &masks);
    let batch = chunk.len();

    let input_ids = Tensor::from_vec(ids_flat, (batch, max_len), device)?;
    // The attention mask marks positions to MASK OUT (1 = padding), shaped
    // for broadcast over the per-head attention scores.
    let attention_mask = Tensor::from_vec(pad_flat, (batch, 1, 1, max_len), device)?;

    Ok(EncodedBatch {
        input_ids,
        attention_mask,
    })
}

/// Run the frozen backbone and take the [CLS] position's hidden state.
fn forward_backbone(backbone: &DistilBertModel, batch: &EncodedBatch) -> Result<Tensor> {
    let hidden = backbone.forward(&batch.input_ids, &batch.attention_mask)?;
    // [batch, seq, dim] → [batch, dim] at position 0
    let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
    Ok(cls)
}

/// Right-pad token ids (pad id 0 for DistilBERT) and produce the inverted
/// padding mask the attention layers expect (1 where padded).
fn pad_batch(ids: &[Vec<u32>], masks: &[Vec<u32>]) -> (Vec<u32>, Vec<u8>, usize) {
    let max_len = ids.iter().map(Vec::len).max().unwrap_or(0);
    let mut ids_flat = Vec::with_capacity(ids.len() * max_len);
    let mut pad_flat = Vec::with_capacity(ids.len() * max_len);

    for (row_ids, row_mask) in ids.iter().zip(masks) {
        for &id in row_ids {
            ids_flat.push(id);
        }
        for &m in row_mask {
            pad_flat.push(u8::from(m == 0));
        }
        for _ in row_ids.len()..max_len {
            ids_flat.push(0);
            pad_flat.push(1);
        }
    }

    (ids_flat, pad_flat, max_len)
}
