//! File-backed option store with atomic writes.
//!
//! Stores one JSON document per option under `dirs::data_dir()/<namespace>/`.
//! Uses temp file + rename for atomic writes.

use crate::store::{check_option_name, OptionStore};
use crate::ProError;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed option store.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory holding the option files.
    dir: PathBuf,
}

impl FileStore {
    /// Create a store under `dirs::data_dir()/<namespace>/`.
    pub fn new(namespace: &str) -> Result<Self, ProError> {
        let base_dir = dirs::data_dir()
            .ok_or_else(|| ProError::StorageIO("Could not find data directory".to_string()))?;
        Self::with_path(base_dir.join(namespace))
    }

    /// Create a store rooted at `dir`.
    pub fn with_path(dir: PathBuf) -> Result<Self, ProError> {
        fs::create_dir_all(&dir)
            .map_err(|e| ProError::StorageIO(format!("Failed to create store dir: {}", e)))?;
        Ok(Self { dir })
    }

    /// Directory holding the option files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn option_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl OptionStore for FileStore {
    fn get(&self, name: &str) -> Result<Option<Value>, ProError> {
        check_option_name(name)?;
        let path = self.option_path(name);

        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .map_err(|e| ProError::StorageIO(format!("Failed to read {}: {}", name, e)))?;
        let value = serde_json::from_str(&json)
            .map_err(|e| ProError::StorageIO(format!("Failed to decode {}: {}", name, e)))?;
        Ok(Some(value))
    }

    fn set(&self, name: &str, value: &Value) -> Result<(), ProError> {
        check_option_name(name)?;
        let target_path = self.option_path(name);
        let temp_path = self.dir.join(format!("{}.tmp", name));

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| ProError::StorageIO(format!("Failed to encode {}: {}", name, e)))?;

        fs::write(&temp_path, &json)
            .map_err(|e| ProError::StorageIO(format!("Failed to write temp file: {}", e)))?;

        fs::rename(&temp_path, &target_path)
            .map_err(|e| ProError::StorageIO(format!("Failed to rename option file: {}", e)))?;

        tracing::debug!(option = name, "option written");
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), ProError> {
        check_option_name(name)?;
        let path = self.option_path(name);

        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| ProError::StorageIO(format!("Failed to delete {}: {}", name, e)))?;
        }

        Ok(())
    }
}
