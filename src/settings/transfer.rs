//! Settings export and import.

use crate::clock::Clock;
use crate::presets::{Preset, PresetMap};
use crate::settings::sanitize::{sanitize_key, sanitize_text_field, scalar_text};
use crate::settings::Settings;
use crate::ProError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Export document.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsExport {
    /// Current settings.
    pub settings: Settings,
    /// User-saved presets.
    pub custom_presets: PresetMap,
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    pub exported_at: String,
    /// Version of the exporting package.
    pub version: String,
}

impl SettingsExport {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ProError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ProError::StorageIO(format!("Failed to encode export: {}", e)))
    }
}

/// Result of a successful import, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedSettings {
    /// Sanitised settings.
    pub settings: Settings,
    /// Sanitised presets, when the document carried any.
    pub custom_presets: Option<PresetMap>,
}

/// Build an export document.
pub fn export(
    settings: &Settings,
    custom_presets: &PresetMap,
    clock: &dyn Clock,
    version: &str,
) -> SettingsExport {
    SettingsExport {
        settings: settings.clone(),
        custom_presets: custom_presets.clone(),
        exported_at: clock.now_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
        version: version.to_string(),
    }
}

/// Download filename for an export made now.
pub fn export_filename(clock: &dyn Clock) -> String {
    format!("loginforge-settings-{}.json", clock.now_utc().format("%Y-%m-%d"))
}

/// Parse and sanitise an uploaded export.
///
/// Preset settings keep only the keys the preset carried, so applying an
/// imported preset touches the same fields as the one that was exported.
pub fn import(filename: &str, contents: &str) -> Result<ImportedSettings, ProError> {
    let is_json = filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(ProError::InvalidImport(
            "Invalid file type. Please upload a JSON file.".to_string(),
        ));
    }

    let invalid = || ProError::InvalidImport("Invalid JSON file.".to_string());
    let document: Value = serde_json::from_str(contents).map_err(|_| invalid())?;
    let document = document.as_object().ok_or_else(invalid)?;
    let settings = document.get("settings").ok_or_else(invalid)?;

    let custom_presets = document
        .get("custom_presets")
        .and_then(Value::as_object)
        .map(sanitize_presets);

    tracing::info!(
        presets = custom_presets.as_ref().map(|p| p.len()).unwrap_or(0),
        "settings import parsed"
    );

    Ok(ImportedSettings {
        settings: Settings::sanitize(settings),
        custom_presets,
    })
}

fn sanitize_presets(raw: &Map<String, Value>) -> PresetMap {
    raw.iter()
        .filter_map(|(key, preset)| {
            let preset = preset.as_object()?;
            let name = preset
                .get("name")
                .and_then(scalar_text)
                .map(|n| sanitize_text_field(&n))
                .unwrap_or_default();
            let raw = preset.get("settings").unwrap_or(&Value::Null);
            let carried = raw.as_object();
            let settings = Settings::sanitize(raw)
                .to_map()
                .into_iter()
                .filter(|(k, _)| carried.is_some_and(|c| c.contains_key(k)))
                .collect();
            Some((sanitize_key(key), Preset { name, settings }))
        })
        .collect()
}
