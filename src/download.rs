// Model download helper.
//
// Downloads three models from HuggingFace:
// 1. DistilBERT SST-2 ONNX — the binary malicious/benign classifier (~65MB)
// 2. DistilBERT MNLI ONNX — the zero-shot threat-type classifier (~65MB)
// 3. DistilBERT base safetensors — the trainer's frozen backbone (~265MB)
//
// Files are stored in a platform-appropriate directory
// (~/.local/share/vigil/models/ on Linux) so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// HuggingFace repo for the binary classifier's ONNX export.
const BINARY_HF_URL: &str =
    "https://huggingface.co/Xenova/distilbert-base-uncased-finetuned-sst-2-english/resolve/main";

/// HuggingFace repo for the NLI model's ONNX export.
const NLI_HF_URL: &str = "https://huggingface.co/Xenova/distilbert-base-uncased-mnli/resolve/main";

/// HuggingFace repo for the trainer backbone.
const BACKBONE_HF_URL: &str = "https://huggingface.co/distilbert-base-uncased/resolve/main";

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/vigil/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vigil")
        .join("models")
}

/// Check whether both inference models (binary + zero-shot) are present.
pub fn inference_files_present(dir: &Path) -> bool {
    let binary = dir.join("binary");
    let nli = dir.join("nli");
    binary.join("model.onnx").exists()
        && binary.join("tokenizer.json").exists()
        && nli.join("model.onnx").exists()
        && nli.join("tokenizer.json").exists()
}

/// Check whether the trainer's DistilBERT backbone is present.
pub fn trainer_files_present(dir: &Path) -> bool {
    let backbone = dir.join("distilbert-base-uncased");
    backbone.join("model.safetensors").exists()
        && backbone.join("config.json").exists()
        && backbone.join("tokenizer.json").exists()
}

/// Download all model files (inference + trainer backbone).
///
/// Shows progress bars for large files. Skips files that already exist.
/// Creates directories as needed.
pub async fn download_models(dir: &Path) -> Result<()> {
    // --- Binary classifier (DistilBERT SST-2) ---
    println!("\nBinary classifier (distilbert-base-uncased-finetuned-sst-2-english):");
    let binary_dir = dir.join("binary");
    fetch(
        &format!("{BINARY_HF_URL}/tokenizer.json"),
        &binary_dir.join("tokenizer.json"),
        false,
    )
    .await?;
    fetch(
        &format!("{BINARY_HF_URL}/onnx/model_quantized.onnx"),
        &binary_dir.join("model.onnx"),
        true,
    )
    .await?;

    // --- Zero-shot classifier (DistilBERT MNLI) ---
    println!("\nZero-shot classifier (distilbert-base-uncased-mnli):");
    let nli_dir = dir.join("nli");
    fetch(
        &format!("{NLI_HF_URL}/tokenizer.json"),
        &nli_dir.join("tokenizer.json"),
        false,
    )
    .await?;
    fetch(
        &format!("{NLI_HF_URL}/onnx/model_quantized.onnx"),
        &nli_dir.join("model.onnx"),
        true,
    )
    .await?;

    // --- Trainer backbone (DistilBERT base) ---
    println!("\nTrainer backbone (distilbert-base-uncased):");
    let backbone_dir = dir.join("distilbert-base-uncased");
    fetch(
        &format!("{BACKBONE_HF_URL}/config.json"),
        &backbone_dir.join("config.json"),
        false,
    )
    .await?;
    fetch(
        &format!("{BACKBONE_HF_URL}/tokenizer.json"),
        &backbone_dir.join("tokenizer.json"),
        false,
    )
    .await?;
    fetch(
        &format!("{BACKBONE_HF_URL}/model.safetensors"),
        &backbone_dir.join("model.safetensors"),
        true,
    )
    .await?;

    Ok(())
}

/// Download `url` to `dest` unless the file already exists.
async fn fetch(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if dest.exists() {
        info!("{} already exists, skipping", dest.display());
        println!("  {name} (already exists)");
        return Ok(());
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create model directory: {}", parent.display()))?;
    }

    println!("  Downloading {name}...");
    download_file(url, dest, show_progress).await
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let total_size = response.content_length();

    // Set up progress bar if requested and we know the size
    let pb = if show_progress {
        let pb = if let Some(size) = total_size {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        };
        Some(pb)
    } else {
        None
    };

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    if let Some(ref pb) = pb {
        pb.set_position(bytes.len() as u64);
    }

    std::fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}
