//! Filesystem-backed storage for client-local state.
//!
//! Each key maps to one JSON document under the data directory; the client
//! keeps its conversation history and task list as independently keyed blobs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage result type.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage backend for persisting data.
#[derive(Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create a new storage instance at the default location.
    ///
    /// # Errors
    ///
    /// Returns error if data directory cannot be determined.
    pub fn new() -> anyhow::Result<Self> {
        let root = Config::data_dir()?.join("client");
        Ok(Self { root })
    }

    /// Create a storage instance at a custom location.
    #[must_use]
    pub const fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the storage root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        let mut path = self.root.join(key);
        path.set_extension("json");
        path
    }

    /// Read a value from storage.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or cannot be parsed.
    pub fn read<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let path = self.path(key);

        if !path.exists() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(&path)?;
        let value: T = serde_json::from_str(&contents)?;
        Ok(value)
    }

    /// Write a value to storage.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be written.
    pub fn write<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let path = self.path(key);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, json)?;
        Ok(())
    }

    /// Remove a value from storage.
    ///
    /// Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be removed.
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Check if a key exists.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.path(key).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> (Storage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_root(dir.path().to_path_buf());
        (storage, dir)
    }

    #[test]
    fn write_then_read_round_trips() {
        let (storage, _dir) = temp_storage();
        let tasks = vec!["buy milk".to_string(), "call bob".to_string()];

        storage.write("tasks", &tasks).unwrap();
        let restored: Vec<String> = storage.read("tasks").unwrap();

        assert_eq!(restored, tasks);
    }

    #[test]
    fn missing_key_is_not_found() {
        let (storage, _dir) = temp_storage();
        let result: Result<Vec<String>> = storage.read("absent");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn remove_deletes_the_blob() {
        let (storage, _dir) = temp_storage();
        storage.write("tasks", &vec!["one".to_string()]).unwrap();
        assert!(storage.exists("tasks"));

        storage.remove("tasks").unwrap();
        assert!(!storage.exists("tasks"));

        // Removing again is a no-op
        storage.remove("tasks").unwrap();
    }
}
