//! Design presets: a built-in set plus user-saved ones.
//!
//! Applying a preset never persists anything; the merged settings are handed
//! back for preview and the caller decides whether to save them.

use crate::clock::Clock;
use crate::settings::sanitize::{sanitize_key, sanitize_text_field};
use crate::settings::{Settings, GLASS_KEYS, STYLE_KEYS};
use crate::store::{load_option, save_option, OptionStore, PRESETS_OPTION};
use crate::ProError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Prefix of every user-saved preset key.
pub const CUSTOM_PREFIX: &str = "custom_";

/// A named partial settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Display name.
    pub name: String,
    /// Settings the preset overrides.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl Preset {
    fn from_json(name: &str, settings: Value) -> Self {
        Self {
            name: name.to_string(),
            settings: match settings {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

/// Presets keyed by preset key.
pub type PresetMap = BTreeMap<String, Preset>;

/// A preset merged onto the current settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPreset {
    /// Display name of the applied preset.
    pub name: String,
    /// Sanitised merged settings, not yet saved.
    pub settings: Settings,
}

/// Presets shipped with the crate.
pub fn built_in_presets() -> PresetMap {
    let mut presets = PresetMap::new();
    presets.insert(
        "classic".to_string(),
        Preset::from_json(
            "Classic",
            json!({
                "background_mode": "solid",
                "background_color": "#f0f0f1",
                "form_bg_color": "#ffffff",
                "form_border_radius": 0,
                "form_border_color": "#c3c4c7",
                "form_shadow_enable": true,
                "label_text_color": "#3c434a",
                "input_bg_color": "#ffffff",
                "input_text_color": "#2c3338",
                "button_bg": "#2271b1",
                "button_bg_hover": "#135e96",
                "button_text_color": "#ffffff",
                "below_form_link_color": "#50575e",
            }),
        ),
    );
    presets.insert(
        "midnight".to_string(),
        Preset::from_json(
            "Midnight",
            json!({
                "background_mode": "solid",
                "background_color": "#0f172a",
                "form_bg_color": "#1e293b",
                "form_border_radius": 12,
                "form_border_color": "#334155",
                "form_shadow_enable": true,
                "label_text_color": "#e2e8f0",
                "input_bg_color": "#0f172a",
                "input_text_color": "#f8fafc",
                "input_border_color": "#475569",
                "input_border_focus": "#38bdf8",
                "button_bg": "#38bdf8",
                "button_bg_hover": "#0ea5e9",
                "button_text_color": "#0f172a",
                "button_border_radius": 8,
                "below_form_link_color": "#94a3b8",
            }),
        ),
    );
    presets.insert(
        "frosted_aurora".to_string(),
        Preset::from_json(
            "Frosted Aurora",
            json!({
                "background_mode": "gradient",
                "background_gradient_1": "#667eea",
                "background_gradient_2": "#764ba2",
                "form_bg_color": "#ffffff",
                "form_border_radius": 16,
                "form_shadow_enable": false,
                "label_text_color": "#ffffff",
                "input_bg_color": "#ffffff",
                "input_text_color": "#1e1e1e",
                "button_bg": "#1e1e1e",
                "button_bg_hover": "#000000",
                "button_text_color": "#ffffff",
                "button_border_radius": 24,
                "below_form_link_color": "#f0f0f1",
                "glass_enabled": true,
                "glass_blur": 12,
                "glass_transparency": 75,
                "glass_border": true,
            }),
        ),
    );
    presets.insert(
        "minimal".to_string(),
        Preset::from_json(
            "Minimal",
            json!({
                "background_mode": "solid",
                "background_color": "#ffffff",
                "form_bg_color": "#ffffff",
                "form_border_radius": 0,
                "form_border_color": "#ffffff",
                "form_shadow_enable": false,
                "label_text_color": "#1e1e1e",
                "input_border_color": "#dcdcde",
                "button_bg": "#1e1e1e",
                "button_bg_hover": "#3c434a",
                "button_text_color": "#ffffff",
                "button_border_radius": 0,
                "below_form_link_color": "#646970",
            }),
        ),
    );
    presets
}

/// Built-in and user-saved presets over an option store.
#[derive(Clone)]
pub struct PresetLibrary {
    store: Arc<dyn OptionStore>,
    clock: Arc<dyn Clock>,
    built_in: PresetMap,
}

impl PresetLibrary {
    /// Library with the shipped built-in presets.
    pub fn new(store: Arc<dyn OptionStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_built_ins(store, clock, built_in_presets())
    }

    /// Library with a caller-supplied built-in set.
    pub fn with_built_ins(
        store: Arc<dyn OptionStore>,
        clock: Arc<dyn Clock>,
        built_in: PresetMap,
    ) -> Self {
        Self {
            store,
            clock,
            built_in,
        }
    }

    /// User-saved presets only.
    pub fn custom(&self) -> Result<PresetMap, ProError> {
        Ok(load_option(self.store.as_ref(), PRESETS_OPTION)?.unwrap_or_default())
    }

    /// Replace every user-saved preset.
    pub fn replace_custom(&self, presets: &PresetMap) -> Result<(), ProError> {
        save_option(self.store.as_ref(), PRESETS_OPTION, presets)
    }

    /// Built-in presets overlaid with user-saved ones.
    pub fn all(&self) -> Result<PresetMap, ProError> {
        let mut all = self.built_in.clone();
        all.extend(self.custom()?);
        Ok(all)
    }

    /// Merge preset `key` onto `current` for preview.
    ///
    /// Glass is switched off unless the preset sets it, so a glass preset
    /// does not leak into the next one applied.
    pub fn apply(&self, key: &str, current: &Settings) -> Result<AppliedPreset, ProError> {
        let key = sanitize_text_field(key);
        let preset = self.all()?.remove(&key).ok_or(ProError::PresetNotFound)?;

        let mut merged = current.to_map();
        merged.extend(preset.settings.clone());
        if !preset.settings.contains_key("glass_enabled") {
            merged.insert("glass_enabled".to_string(), Value::Bool(false));
        }

        tracing::debug!(preset = %key, "preset applied for preview");
        Ok(AppliedPreset {
            name: preset.name,
            settings: Settings::sanitize(&Value::Object(merged)),
        })
    }

    /// Save the styling part of `current` as a new preset. Returns its key.
    pub fn save(&self, name: &str, current: &Settings) -> Result<String, ProError> {
        let name = sanitize_text_field(name);
        if name.is_empty() {
            return Err(ProError::EmptyPresetName);
        }

        let key = format!(
            "{}{}_{}",
            CUSTOM_PREFIX,
            sanitize_key(&name),
            self.clock.unix_timestamp()
        );

        let current = current.to_map();
        let settings = STYLE_KEYS
            .iter()
            .chain(GLASS_KEYS)
            .filter_map(|k| current.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect();

        let mut custom = self.custom()?;
        custom.insert(key.clone(), Preset { name, settings });
        self.replace_custom(&custom)?;

        tracing::info!(preset = %key, "preset saved");
        Ok(key)
    }

    /// Delete a user-saved preset. Missing keys are not an error.
    pub fn delete(&self, key: &str) -> Result<(), ProError> {
        let key = sanitize_text_field(key);
        if !key.starts_with(CUSTOM_PREFIX) {
            return Err(ProError::BuiltInPreset);
        }

        let mut custom = self.custom()?;
        if custom.remove(&key).is_some() {
            self.replace_custom(&custom)?;
            tracing::info!(preset = %key, "preset deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::store::MemoryStore;

    fn library() -> (Arc<MemoryStore>, PresetLibrary) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(MockClock::from_rfc3339("2026-01-15T12:00:00Z"));
        (store.clone(), PresetLibrary::new(store, clock))
    }

    #[test]
    fn test_built_ins_are_valid() {
        for (key, preset) in built_in_presets() {
            assert!(!key.starts_with(CUSTOM_PREFIX));
            assert!(!preset.name.is_empty());
            let sanitized = Settings::sanitize(&Value::Object(preset.settings.clone()));
            for (k, v) in &preset.settings {
                if let Some(design) = sanitized.design.get(k) {
                    assert_eq!(design, v, "preset {} key {}", key, k);
                }
            }
        }
    }

    #[test]
    fn test_apply_unknown() {
        let (_, library) = library();
        let err = library.apply("nope", &Settings::default()).unwrap_err();
        assert!(matches!(err, ProError::PresetNotFound));
    }

    #[test]
    fn test_apply_forces_glass_off() {
        let (store, library) = library();
        let mut current = Settings::default();
        current.glass_enabled = true;
        current.custom_css = ".keep { }".into();

        let applied = library.apply("midnight", &current).unwrap();
        assert_eq!(applied.name, "Midnight");
        assert!(!applied.settings.glass_enabled);
        assert_eq!(applied.settings.design_str("form_bg_color"), Some("#1e293b"));
        assert_eq!(applied.settings.custom_css, ".keep { }");

        assert!(store.get(crate::store::SETTINGS_OPTION).unwrap().is_none());
    }

    #[test]
    fn test_apply_glass_preset() {
        let (_, library) = library();
        let applied = library.apply("frosted_aurora", &Settings::default()).unwrap();
        assert!(applied.settings.glass_enabled);
        assert_eq!(applied.settings.glass_blur, 12);
        assert_eq!(applied.settings.glass_transparency, 75);
    }

    #[test]
    fn test_save_and_list() {
        let (_, library) = library();
        let mut current = Settings::default();
        current.glass_enabled = true;
        current.glass_blur = 20;
        current
            .design
            .insert("button_bg".into(), Value::String("#ff0000".into()));

        let key = library.save("  My <b>Brand</b> ", &current).unwrap();
        assert_eq!(key, "custom_mybrand_1768478400");

        let all = library.all().unwrap();
        assert!(all.contains_key("classic"));
        let saved = &all[&key];
        assert_eq!(saved.name, "My Brand");
        assert_eq!(saved.settings["button_bg"], "#ff0000");
        assert_eq!(saved.settings["glass_enabled"], true);
        assert_eq!(saved.settings["glass_blur"], 20);
        assert!(!saved.settings.contains_key("custom_css"));
        assert!(!saved.settings.contains_key("redirect_login"));

        let applied = library.apply(&key, &Settings::default()).unwrap();
        assert!(applied.settings.glass_enabled);
        assert_eq!(applied.settings.design_str("button_bg"), Some("#ff0000"));
    }

    #[test]
    fn test_save_empty_name() {
        let (_, library) = library();
        let err = library.save(" <i></i> ", &Settings::default()).unwrap_err();
        assert!(matches!(err, ProError::EmptyPresetName));
    }

    #[test]
    fn test_custom_overrides_built_in() {
        let (_, library) = library();
        let mut custom = PresetMap::new();
        custom.insert(
            "classic".into(),
            Preset::from_json("Mine", json!({"button_bg": "#000000"})),
        );
        library.replace_custom(&custom).unwrap();
        assert_eq!(library.all().unwrap()["classic"].name, "Mine");
    }

    #[test]
    fn test_delete() {
        let (_, library) = library();
        assert!(matches!(
            library.delete("midnight").unwrap_err(),
            ProError::BuiltInPreset
        ));

        let key = library.save("Temp", &Settings::default()).unwrap();
        library.delete(&key).unwrap();
        assert!(!library.all().unwrap().contains_key(&key));

        library.delete("custom_missing_1").unwrap();
    }
}
