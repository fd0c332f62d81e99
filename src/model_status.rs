// Model status store — the JSON document driving classification behavior.
//
// A single `model_status.json` holds the active classification mode plus
// per-model metadata (name, last dataset, last update). It is read on every
// classification request and written by the admin mode switch and by
// retraining.
//
// Initialization is explicit: `init()` seeds the file with defaults and is
// called by `vigil init` and at server startup. Read paths never create the
// file. Read-modify-write updates are serialized behind an internal lock so
// two concurrent switches can't drop each other's write; across processes
// the last writer still wins.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The active classification strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Both classifiers; binary drives the verdict, zero-shot names the threat
    Hybrid,
    /// Binary malicious/benign call only
    BinaryOnly,
    /// Zero-shot threat typing only
    MultiOnly,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Hybrid => "hybrid",
            Mode::BinaryOnly => "binary-only",
            Mode::MultiOnly => "multi-only",
        }
    }

    /// Parse a mode string. Returns None for anything outside the three
    /// recognized values — callers decide whether that's an error (mode
    /// switch) or a fallback to hybrid (classification).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hybrid" => Some(Mode::Hybrid),
            "binary-only" => Some(Mode::BinaryOnly),
            "multi-only" => Some(Mode::MultiOnly),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata for one of the two models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: String,
    /// Filename of the dataset the model was last trained on
    pub trained_on: String,
    pub last_updated: String,
}

/// The full status document.
///
/// `mode` stays a raw string in the document so an unrecognized value stored
/// by hand round-trips instead of failing deserialization; `get_mode`
/// degrades it to hybrid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub binary_model: ModelInfo,
    pub multi_model: ModelInfo,
    pub mode: String,
}

impl ModelStatus {
    /// Built-in defaults used to seed the document on `init`.
    pub fn defaults() -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            binary_model: ModelInfo {
                name: "distilbert-base-uncased-finetuned-sst-2-english".to_string(),
                model_type: "binary".to_string(),
                trained_on: "binary_dataset_v1.csv".to_string(),
                last_updated: now.clone(),
            },
            multi_model: ModelInfo {
                name: "distilbert-base-uncased-mnli".to_string(),
                model_type: "multi-class".to_string(),
                trained_on: "multi_dataset_v1.csv".to_string(),
                last_updated: now,
            },
            mode: Mode::Hybrid.as_str().to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModeError {
    #[error("Invalid mode value: {0:?} (expected hybrid, binary-only, or multi-only)")]
    InvalidMode(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// File-backed store for the status document.
pub struct StatusStore {
    path: PathBuf,
    // Serializes read-modify-write sequences (switch_mode, retraining's
    // metadata update) within this process.
    lock: Mutex<()>,
}

impl StatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed the document with defaults if it doesn't exist yet.
    /// The documented initialization step — reads never do this implicitly.
    pub fn init(&self) -> Result<()> {
        let _guard = self.lock.lock().expect("status lock poisoned");
        if !self.path.exists() {
            self.write_unlocked(&ModelStatus::defaults())?;
        }
        Ok(())
    }

    /// Current mode. Falls back to hybrid when the document is absent or
    /// carries an unrecognized mode string; does not create the document.
    pub fn get_mode(&self) -> Result<Mode> {
        match self.try_read_status()? {
            Some(status) => Ok(Mode::parse(&status.mode).unwrap_or(Mode::Hybrid)),
            None => Ok(Mode::Hybrid),
        }
    }

    /// Full status document, substituting built-in defaults when the file is
    /// absent. The defaults are NOT persisted — that's `init`'s job.
    pub fn read_status(&self) -> Result<ModelStatus> {
        Ok(self.try_read_status()?.unwrap_or_else(ModelStatus::defaults))
    }

    /// Full status document, or None when the file doesn't exist. The
    /// retraining path uses this: an absent document there is a fatal
    /// configuration error, never self-healed.
    pub fn try_read_status(&self) -> Result<Option<ModelStatus>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let status = serde_json::from_str(&json)
            .with_context(|| format!("Malformed status document at {}", self.path.display()))?;
        Ok(Some(status))
    }

    /// Persist the full document, overwriting any previous content.
    pub fn write_status(&self, status: &ModelStatus) -> Result<()> {
        let _guard = self.lock.lock().expect("status lock poisoned");
        self.write_unlocked(status)
    }

    /// Replace only the mode field, leaving model metadata untouched.
    pub fn switch_mode(&self, new_mode: &str) -> Result<Mode, ModeError> {
        let mode = Mode::parse(new_mode).ok_or_else(|| ModeError::InvalidMode(new_mode.to_string()))?;

        let _guard = self.lock.lock().expect("status lock poisoned");
        let mut status = self
            .try_read_status()
            .map_err(ModeError::Other)?
            .unwrap_or_else(ModelStatus::defaults);
        status.mode = mode.as_str().to_string();
        self.write_unlocked(&status).map_err(ModeError::Other)?;
        Ok(mode)
    }

    /// Apply a read-modify-write update to the document under the lock.
    /// Used by retraining to fold in per-model metadata.
    pub fn update_status<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut ModelStatus),
    {
        let _guard = self.lock.lock().expect("status lock poisoned");
        let mut status = self.try_read_status()?.unwrap_or_else(ModelStatus::defaults);
        apply(&mut status);
        self.write_unlocked(&status)
    }

    fn write_unlocked(&self, status: &ModelStatus) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory for {}", self.path.display())
                })?;
            }
        }
        let json = serde_json::to_string_pretty(status)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> StatusStore {
        StatusStore::new(dir.path().join("model_status.json"))
    }

    #[test]
    fn test_mode_parse_recognized_values() {
        assert_eq!(Mode::parse("hybrid"), Some(Mode::Hybrid));
        assert_eq!(Mode::parse("binary-only"), Some(Mode::BinaryOnly));
        assert_eq!(Mode::parse("multi-only"), Some(Mode::MultiOnly));
        assert_eq!(Mode::parse("turbo"), None);
        assert_eq!(Mode::parse(""), None);
    }

    #[test]
    fn test_get_mode_defaults_to_hybrid_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.get_mode().unwrap(), Mode::Hybrid);
        // Reading must not have created the file
        assert!(!store.path().exists());
    }

    #[test]
    fn test_read_status_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let status = store.read_status().unwrap();
        assert_eq!(status.mode, "hybrid");
        assert!(!store.path().exists());
    }

    #[test]
    fn test_init_seeds_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.init().unwrap();
        assert!(store.path().exists());

        // A second init must not clobber an existing document
        store.switch_mode("multi-only").unwrap();
        store.init().unwrap();
        assert_eq!(store.get_mode().unwrap(), Mode::MultiOnly);
    }

    #[test]
    fn test_switch_mode_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.init().unwrap();
        store.switch_mode("multi-only").unwrap();
        assert_eq!(store.get_mode().unwrap(), Mode::MultiOnly);
        store.switch_mode("binary-only").unwrap();
        assert_eq!(store.get_mode().unwrap(), Mode::BinaryOnly);
    }

    #[test]
    fn test_switch_mode_rejects_unknown_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.init().unwrap();
        store.switch_mode("multi-only").unwrap();

        let err = store.switch_mode("aggressive").unwrap_err();
        assert!(matches!(err, ModeError::InvalidMode(_)));
        // The stored mode must be untouched by the failed switch
        assert_eq!(store.get_mode().unwrap(), Mode::MultiOnly);
    }

    #[test]
    fn test_switch_preserves_model_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.init().unwrap();

        let before = store.read_status().unwrap();
        store.switch_mode("binary-only").unwrap();
        let after = store.read_status().unwrap();

        assert_eq!(after.binary_model.trained_on, before.binary_model.trained_on);
        assert_eq!(after.multi_model.name, before.multi_model.name);
        assert_eq!(after.mode, "binary-only");
    }

    #[test]
    fn test_unrecognized_stored_mode_reads_as_hybrid() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut status = ModelStatus::defaults();
        status.mode = "experimental".to_string();
        store.write_status(&status).unwrap();

        assert_eq!(store.get_mode().unwrap(), Mode::Hybrid);
        // The raw string round-trips even though get_mode degrades it
        assert_eq!(store.read_status().unwrap().mode, "experimental");
    }

    #[test]
    fn test_update_status_folds_in_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.init().unwrap();

        store
            .update_status(|s| {
                s.binary_model.trained_on = "uploaded.csv".to_string();
            })
            .unwrap();

        let status = store.read_status().unwrap();
        assert_eq!(status.binary_model.trained_on, "uploaded.csv");
    }
}
