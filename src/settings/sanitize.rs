//! Field sanitisers shared by settings saves, imports and presets.
//!
//! Each function is idempotent: feeding its output back in returns the same
//! value, which is what makes export/import round trips stable.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde_json::Value;
use url::Url;

static SCRIPT_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script\s*>|<style[^>]*>.*?</style\s*>")
        .expect("static regex")
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*(?:>|$)").expect("static regex"));

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").expect("static regex"));

/// Remove `<script>`/`<style>` blocks with their content, then every tag.
/// The result is trimmed and contains no `<`.
pub fn strip_all_tags(input: &str) -> String {
    let without_blocks = SCRIPT_STYLE.replace_all(input, "");
    TAG.replace_all(&without_blocks, "").trim().to_string()
}

/// Single-line text: tags stripped, whitespace runs collapsed to one space.
pub fn sanitize_text_field(input: &str) -> String {
    strip_all_tags(input)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Multi-line text: tags stripped, line endings normalised, trailing
/// whitespace per line removed.
pub fn sanitize_textarea_field(input: &str) -> String {
    let stripped = strip_all_tags(&input.replace("\r\n", "\n").replace('\r', "\n"));
    stripped
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Lowercase `[a-z0-9_-]` only.
pub fn sanitize_key(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| {
            let c = c.to_ascii_lowercase();
            (c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-').then_some(c)
        })
        .collect()
}

/// `#rgb` or `#rrggbb`, otherwise `None`.
pub fn sanitize_hex_color(input: &str) -> Option<String> {
    let trimmed = input.trim();
    HEX_COLOR.is_match(trimmed).then(|| trimmed.to_string())
}

/// Keep absolute http(s) URLs (normalised) and root-relative paths; anything
/// else becomes empty.
pub fn esc_url_raw(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') && !trimmed.starts_with("//") {
        let clean = !trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>' || c == '"');
        return if clean { trimmed.to_string() } else { String::new() };
    }
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => url.into(),
        _ => String::new(),
    }
}

/// Absolute integer value of a JSON number, numeric string or bool.
pub fn absint(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i64::unsigned_abs)
            .or_else(|| n.as_u64())
            .or_else(|| n.as_f64().map(|f| f.trunc().abs() as u64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            let unsigned = s
                .strip_prefix('-')
                .or_else(|| s.strip_prefix('+'))
                .unwrap_or(s);
            let digits: String = unsigned.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        }
        Value::Bool(b) => u64::from(*b),
        _ => 0,
    }
}

/// Loose truthiness of a submitted value (`"0"`, `""`, `0`, `false`, `null`,
/// empty arrays and objects are false).
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text value of a JSON scalar (numbers and bools stringified).
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1".to_string() } else { String::new() }),
        _ => None,
    }
}
