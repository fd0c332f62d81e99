// Training data loading — CSV parsing, label encoding, and the seeded
// train/validation split.
//
// Datasets are plain CSV with `text` and `label` columns. Label values map
// case-insensitively to the binary classes: "negative" is the malicious
// class (1), anything else is benign (0).

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;

use super::TrainingError;

/// Fixed seed for the train/validation shuffle so repeated runs over the
/// same dataset produce the same split.
pub const SPLIT_SEED: u64 = 42;

/// Validation share of the dataset.
pub const VALIDATION_FRACTION: f64 = 0.2;

/// The malicious class id.
pub const MALICIOUS_CLASS: u32 = 1;

#[derive(Debug, Deserialize)]
struct CsvRow {
    text: String,
    label: String,
}

/// A single labeled training example.
#[derive(Debug, Clone)]
pub struct LabeledExample {
    pub text: String,
    /// 1 = malicious, 0 = benign
    pub label: u32,
}

/// Map a raw label value to its binary class.
pub fn encode_label(label: &str) -> u32 {
    if label.trim().eq_ignore_ascii_case("negative") {
        MALICIOUS_CLASS
    } else {
        0
    }
}

/// Load and label-encode a CSV dataset.
///
/// Fails with InvalidDataset when the `text` or `label` column is missing.
pub fn load_dataset(path: &Path) -> Result<Vec<LabeledExample>, TrainingError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        TrainingError::InvalidDataset(format!("Failed to open dataset {}: {e}", path.display()))
    })?;

    let headers = reader
        .headers()
        .map_err(|e| TrainingError::InvalidDataset(format!("Unreadable CSV header: {e}")))?
        .clone();
    for required in ["text", "label"] {
        if !headers.iter().any(|h| h == required) {
            return Err(TrainingError::InvalidDataset(
                "Dataset must contain 'text' and 'label' columns".to_string(),
            ));
        }
    }

    let mut examples = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        let row = row
            .map_err(|e| TrainingError::InvalidDataset(format!("Malformed CSV row: {e}")))?;
        examples.push(LabeledExample {
            label: encode_label(&row.label),
            text: row.text,
        });
    }

    if examples.is_empty() {
        return Err(TrainingError::InvalidDataset(
            "Dataset contains no rows".to_string(),
        ));
    }

    Ok(examples)
}

/// Shuffle with the given seed and split off the validation share.
/// Returns (train, validation).
pub fn train_val_split(
    mut examples: Vec<LabeledExample>,
    seed: u64,
) -> (Vec<LabeledExample>, Vec<LabeledExample>) {
    let mut rng = StdRng::seed_from_u64(seed);
    examples.shuffle(&mut rng);

    let val_len = ((examples.len() as f64) * VALIDATION_FRACTION).ceil() as usize;
    let val_len = val_len.min(examples.len());
    let train = examples.split_off(val_len);
    // examples now holds the first val_len entries
    (train, examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_encode_label_case_insensitive() {
        assert_eq!(encode_label("negative"), 1);
        assert_eq!(encode_label("NEGATIVE"), 1);
        assert_eq!(encode_label("Negative"), 1);
        assert_eq!(encode_label("positive"), 0);
        assert_eq!(encode_label("benign"), 0);
        assert_eq!(encode_label(""), 0);
    }

    #[test]
    fn test_load_dataset_maps_labels() {
        let file = write_csv("text,label\nclick here,negative\nhello friend,positive\n");
        let examples = load_dataset(file.path()).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].label, 1);
        assert_eq!(examples[0].text, "click here");
        assert_eq!(examples[1].label, 0);
    }

    #[test]
    fn test_load_dataset_missing_column() {
        let file = write_csv("body,tag\nclick here,negative\n");
        let err = load_dataset(file.path()).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidDataset(_)));
        assert!(err.to_string().contains("'text' and 'label'"));
    }

    #[test]
    fn test_load_dataset_empty_rows() {
        let file = write_csv("text,label\n");
        assert!(matches!(
            load_dataset(file.path()).unwrap_err(),
            TrainingError::InvalidDataset(_)
        ));
    }

    #[test]
    fn test_load_dataset_extra_columns_tolerated() {
        let file = write_csv("id,text,label\n1,click here,negative\n");
        let examples = load_dataset(file.path()).unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].label, 1);
    }

    fn numbered_examples(n: usize) -> Vec<LabeledExample> {
        (0..n)
            .map(|i| LabeledExample {
                text: format!("example {i}"),
                label: (i % 2) as u32,
            })
            .collect()
    }

    #[test]
    fn test_split_sizes_80_20() {
        let (train, val) = train_val_split(numbered_examples(100), SPLIT_SEED);
        assert_eq!(val.len(), 20);
        assert_eq!(train.len(), 80);
    }

    #[test]
    fn test_split_rounds_validation_up() {
        let (train, val) = train_val_split(numbered_examples(11), SPLIT_SEED);
        assert_eq!(val.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_split_is_reproducible() {
        let (train_a, val_a) = train_val_split(numbered_examples(50), SPLIT_SEED);
        let (train_b, val_b) = train_val_split(numbered_examples(50), SPLIT_SEED);
        let texts = |v: &[LabeledExample]| v.iter().map(|e| e.text.clone()).collect::<Vec<_>>();
        assert_eq!(texts(&train_a), texts(&train_b));
        assert_eq!(texts(&val_a), texts(&val_b));
    }

    #[test]
    fn test_split_differs_across_seeds() {
        let (_, val_a) = train_val_split(numbered_examples(50), 42);
        let (_, val_b) = train_val_split(numbered_examples(50), 43);
        let texts = |v: &[LabeledExample]| v.iter().map(|e| e.text.clone()).collect::<Vec<_>>();
        assert_ne!(texts(&val_a), texts(&val_b));
    }
}
