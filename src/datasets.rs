// Dataset store — a directory of uploaded CSV training datasets.
//
// Files are identified by bare filename. Uploads silently overwrite on name
// collision (no deduplication, no checksum); deletes of unknown names fail.
// Listing order follows the filesystem, no ordering guarantee.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Invalid dataset filename: {0:?}")]
    InvalidName(String),
    #[error("Dataset not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One entry in the dataset listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub filename: String,
    pub uploaded_at: String,
}

pub struct DatasetStore {
    dir: PathBuf,
}

impl DatasetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a client-supplied filename to a path inside the store.
    /// Rejects names that would escape the directory.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, DatasetError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(DatasetError::InvalidName(filename.to_string()));
        }
        Ok(self.dir.join(filename))
    }

    /// Resolve a filename to an existing dataset file.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, DatasetError> {
        let path = self.path_for(filename)?;
        if !path.exists() {
            return Err(DatasetError::NotFound(filename.to_string()));
        }
        Ok(path)
    }

    /// Write a dataset, silently replacing any existing file with that name.
    pub fn save(&self, filename: &str, bytes: &[u8]) -> Result<(), DatasetError> {
        let path = self.path_for(filename)?;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create dataset directory {}", self.dir.display()))?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write dataset {}", path.display()))?;
        Ok(())
    }

    /// List all datasets with their upload times.
    pub fn list(&self) -> Result<Vec<DatasetEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read dataset directory {}", self.dir.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let uploaded_at = entry
                .metadata()?
                .modified()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
                .unwrap_or_default();
            entries.push(DatasetEntry {
                filename: entry.file_name().to_string_lossy().into_owned(),
                uploaded_at,
            });
        }
        Ok(entries)
    }

    /// Delete a dataset; fails with NotFound if it doesn't exist.
    pub fn delete(&self, filename: &str) -> Result<(), DatasetError> {
        let path = self.resolve(filename)?;
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to delete dataset {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> DatasetStore {
        DatasetStore::new(dir.path().join("datasets"))
    }

    #[test]
    fn test_save_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save("spam.csv", b"text,label\nhi,positive\n").unwrap();

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "spam.csv");
        assert!(!entries[0].uploaded_at.is_empty());
    }

    #[test]
    fn test_save_overwrites_silently() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save("spam.csv", b"first").unwrap();
        store.save("spam.csv", b"second").unwrap();

        // One entry, holding the second upload's content
        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 1);
        let content = std::fs::read(store.resolve("spam.csv").unwrap()).unwrap();
        assert_eq!(content, b"second");
    }

    #[test]
    fn test_list_empty_when_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let err = store.delete("ghost.csv").unwrap_err();
        assert!(matches!(err, DatasetError::NotFound(_)));
    }

    #[test]
    fn test_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save("spam.csv", b"data").unwrap();
        store.delete("spam.csv").unwrap();
        assert!(store.list().unwrap().is_empty());
        // A second delete now fails
        assert!(matches!(
            store.delete("spam.csv").unwrap_err(),
            DatasetError::NotFound(_)
        ));
    }

    #[test]
    fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for name in ["../escape.csv", "a/b.csv", "..", ""] {
            assert!(matches!(
                store.path_for(name).unwrap_err(),
                DatasetError::InvalidName(_)
            ));
        }
    }
}
