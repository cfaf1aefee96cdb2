//! Login page design settings.
//!
//! The Pro fields are typed; the host's core design keys (colours, radii,
//! background mode) ride along in a flattened map so settings written by a
//! newer host survive a load/save cycle.

pub mod sanitize;
pub mod transfer;

use crate::store::{save_option, OptionStore, SETTINGS_OPTION};
use crate::ProError;
use sanitize::{
    absint, esc_url_raw, sanitize_hex_color, sanitize_key, sanitize_text_field,
    sanitize_textarea_field, scalar_text, strip_all_tags, truthy,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Horizontal placement of the login form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionX {
    /// Left edge.
    Left,
    /// Centred.
    #[default]
    Center,
    /// Right edge.
    Right,
}

impl PositionX {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Flexbox alignment value.
    pub fn flex_value(&self) -> &'static str {
        match self {
            Self::Left => "flex-start",
            Self::Center => "center",
            Self::Right => "flex-end",
        }
    }
}

/// Vertical placement of the login form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionY {
    /// Top edge.
    Top,
    /// Centred.
    #[default]
    Center,
    /// Bottom edge.
    Bottom,
}

impl PositionY {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }

    /// Flexbox alignment value.
    pub fn flex_value(&self) -> &'static str {
        match self {
            Self::Top => "flex-start",
            Self::Center => "center",
            Self::Bottom => "flex-end",
        }
    }
}

/// Form spacing preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStyle {
    /// Tight padding.
    Compact,
    /// Host default spacing.
    #[default]
    Standard,
    /// Generous padding.
    Spacious,
}

impl LayoutStyle {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "compact" => Some(Self::Compact),
            "standard" => Some(Self::Standard),
            "spacious" => Some(Self::Spacious),
            _ => None,
        }
    }
}

/// Keys owned by the typed Pro fields.
pub const PRO_KEYS: &[&str] = &[
    "active_preset",
    "glass_enabled",
    "glass_blur",
    "glass_transparency",
    "glass_border",
    "layout_position_x",
    "layout_position_y",
    "layout_style",
    "hide_footer_links",
    "redirect_login",
    "redirect_logout",
    "custom_message",
    "custom_css",
];

/// Styling keys a saved preset captures.
pub const STYLE_KEYS: &[&str] = &[
    "background_mode",
    "background_color",
    "background_gradient_1",
    "background_gradient_2",
    "form_bg_color",
    "form_border_radius",
    "form_border_color",
    "form_shadow_enable",
    "label_text_color",
    "input_bg_color",
    "input_text_color",
    "input_border_color",
    "input_border_focus",
    "button_bg",
    "button_bg_hover",
    "button_text_color",
    "button_border_radius",
    "below_form_link_color",
];

/// Pro glass keys a saved preset captures alongside [`STYLE_KEYS`].
pub const GLASS_KEYS: &[&str] = &[
    "glass_enabled",
    "glass_blur",
    "glass_transparency",
    "glass_border",
];

/// Core design defaults.
pub fn design_defaults() -> BTreeMap<String, Value> {
    let defaults = json!({
        "background_mode": "solid",
        "background_color": "#f0f0f1",
        "background_gradient_1": "#667eea",
        "background_gradient_2": "#764ba2",
        "form_bg_color": "#ffffff",
        "form_border_radius": 0,
        "form_border_color": "#c3c4c7",
        "form_shadow_enable": true,
        "label_text_color": "#3c434a",
        "input_bg_color": "#ffffff",
        "input_text_color": "#2c3338",
        "input_border_color": "#8c8f94",
        "input_border_focus": "#2271b1",
        "button_bg": "#2271b1",
        "button_bg_hover": "#135e96",
        "button_text_color": "#ffffff",
        "button_border_radius": 3,
        "below_form_link_color": "#50575e",
    });
    match defaults {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    }
}

fn is_color_key(key: &str) -> bool {
    key.ends_with("_color")
        || key.starts_with("background_gradient")
        || matches!(key, "button_bg" | "button_bg_hover" | "input_border_focus")
}

/// Full design settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the last applied preset (informational).
    pub active_preset: String,
    /// Frosted-glass form background.
    pub glass_enabled: bool,
    /// Backdrop blur in pixels.
    pub glass_blur: u64,
    /// Background transparency, 0..=100.
    pub glass_transparency: u8,
    /// Thin translucent border on the glass form.
    pub glass_border: bool,
    /// Horizontal form placement.
    pub layout_position_x: PositionX,
    /// Vertical form placement.
    pub layout_position_y: PositionY,
    /// Form spacing.
    pub layout_style: LayoutStyle,
    /// Hide the links below the form.
    pub hide_footer_links: bool,
    /// Where to send users after login (empty = host default).
    pub redirect_login: String,
    /// Where to send users after logout (empty = host default).
    pub redirect_logout: String,
    /// Text shown below the form.
    pub custom_message: String,
    /// Extra CSS appended to the login page.
    pub custom_css: String,
    /// Core design keys.
    #[serde(flatten)]
    pub design: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_preset: String::new(),
            glass_enabled: false,
            glass_blur: 10,
            glass_transparency: 80,
            glass_border: true,
            layout_position_x: PositionX::Center,
            layout_position_y: PositionY::Center,
            layout_style: LayoutStyle::Standard,
            hide_footer_links: false,
            redirect_login: String::new(),
            redirect_logout: String::new(),
            custom_message: String::new(),
            custom_css: String::new(),
            design: design_defaults(),
        }
    }
}

impl Settings {
    /// Sanitise raw submitted settings.
    ///
    /// Missing checkbox fields read as unchecked; other missing fields keep
    /// their defaults. Non-object input yields the sanitised empty form.
    pub fn sanitize(input: &Value) -> Self {
        let empty = Map::new();
        let input = input.as_object().unwrap_or(&empty);
        let text = |key: &str| input.get(key).and_then(scalar_text);

        let mut settings = Settings::default();

        if let Some(value) = text("active_preset") {
            settings.active_preset = sanitize_text_field(&value);
        }

        settings.glass_enabled = input.get("glass_enabled").is_some_and(truthy);
        if let Some(value) = input.get("glass_blur") {
            settings.glass_blur = absint(value);
        }
        if let Some(value) = input.get("glass_transparency") {
            settings.glass_transparency = absint(value).min(100) as u8;
        }
        settings.glass_border = input.get("glass_border").is_some_and(truthy);

        if let Some(value) = text("layout_position_x") {
            settings.layout_position_x = PositionX::parse(&value).unwrap_or_default();
        }
        if let Some(value) = text("layout_position_y") {
            settings.layout_position_y = PositionY::parse(&value).unwrap_or_default();
        }
        if let Some(value) = text("layout_style") {
            settings.layout_style = LayoutStyle::parse(&value).unwrap_or_default();
        }
        settings.hide_footer_links = input.get("hide_footer_links").is_some_and(truthy);

        if let Some(value) = text("redirect_login") {
            settings.redirect_login = esc_url_raw(&value);
        }
        if let Some(value) = text("redirect_logout") {
            settings.redirect_logout = esc_url_raw(&value);
        }
        if let Some(value) = text("custom_message") {
            settings.custom_message = sanitize_textarea_field(&value);
        }
        if let Some(value) = text("custom_css") {
            settings.custom_css = strip_all_tags(&value);
        }

        for (key, value) in input {
            if PRO_KEYS.contains(&key.as_str()) || sanitize_key(key) != *key {
                continue;
            }
            if let Some(clean) = sanitize_design_value(key, value) {
                settings.design.insert(key.clone(), clean);
            }
        }

        settings
    }

    /// Load settings from the store, sanitised. Defaults when never saved.
    pub fn load(store: &dyn OptionStore) -> Result<Self, ProError> {
        Ok(match store.get(SETTINGS_OPTION)? {
            Some(value) => Self::sanitize(&value),
            None => Self::default(),
        })
    }

    /// Persist settings.
    pub fn save(&self, store: &dyn OptionStore) -> Result<(), ProError> {
        save_option(store, SETTINGS_OPTION, self)?;
        tracing::debug!("settings saved");
        Ok(())
    }

    /// Settings as a flat JSON object.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Core design value as a string.
    pub fn design_str(&self, key: &str) -> Option<&str> {
        self.design.get(key).and_then(Value::as_str)
    }
}

fn sanitize_design_value(key: &str, value: &Value) -> Option<Value> {
    if is_color_key(key) {
        let color = value.as_str().and_then(sanitize_hex_color);
        return match color {
            Some(color) => Some(Value::String(color)),
            None => design_defaults().remove(key),
        };
    }
    match value {
        Value::String(s) => Some(Value::String(sanitize_text_field(s))),
        Value::Bool(_) | Value::Number(_) => Some(value.clone()),
        _ => None,
    }
}
