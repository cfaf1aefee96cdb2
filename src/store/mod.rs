//! Key-value option storage.
//!
//! The host application owns persistence; the crate only needs named JSON
//! values it can read, replace and delete.

pub mod file;

use crate::ProError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

pub use file::FileStore;

/// Option holding the activated license record.
pub const LICENSE_OPTION: &str = "loginforge_pro_license";

/// Option holding the design settings.
pub const SETTINGS_OPTION: &str = "loginforge_settings";

/// Option holding user-saved presets.
pub const PRESETS_OPTION: &str = "loginforge_custom_presets";

/// Option holding the CAPTCHA configuration.
pub const SECURITY_OPTION: &str = "loginforge_security_settings";

/// Named JSON value storage.
pub trait OptionStore: Send + Sync {
    /// Read an option. `Ok(None)` when it was never written.
    fn get(&self, name: &str) -> Result<Option<Value>, ProError>;

    /// Replace an option.
    fn set(&self, name: &str, value: &Value) -> Result<(), ProError>;

    /// Remove an option. Removing a missing option is not an error.
    fn delete(&self, name: &str) -> Result<(), ProError>;
}

/// Read an option and decode it, treating undecodable values as absent.
pub fn load_option<T: DeserializeOwned>(
    store: &dyn OptionStore,
    name: &str,
) -> Result<Option<T>, ProError> {
    let Some(value) = store.get(name)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(e) => {
            tracing::warn!(option = name, error = %e, "ignoring malformed option");
            Ok(None)
        }
    }
}

/// Encode and write an option.
pub fn save_option<T: Serialize>(
    store: &dyn OptionStore,
    name: &str,
    value: &T,
) -> Result<(), ProError> {
    let value = serde_json::to_value(value)
        .map_err(|e| ProError::StorageIO(format!("Failed to encode {}: {}", name, e)))?;
    store.set(name, &value)
}

/// Reject names that are not `[a-z0-9_-]+`.
pub(crate) fn check_option_name(name: &str) -> Result<(), ProError> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(ProError::StorageIO(format!("Invalid option name: {:?}", name)))
    }
}

/// In-process option store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    options: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Value>>, ProError> {
        self.options
            .lock()
            .map_err(|_| ProError::StorageIO("option store lock poisoned".to_string()))
    }
}

impl OptionStore for MemoryStore {
    fn get(&self, name: &str) -> Result<Option<Value>, ProError> {
        check_option_name(name)?;
        Ok(self.lock()?.get(name).cloned())
    }

    fn set(&self, name: &str, value: &Value) -> Result<(), ProError> {
        check_option_name(name)?;
        self.lock()?.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), ProError> {
        check_option_name(name)?;
        self.lock()?.remove(name);
        Ok(())
    }
}
