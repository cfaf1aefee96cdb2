//! Store and siteverify response structs.

use crate::ProError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Store reply to `licenses/activate/{key}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationResponse {
    /// Whether the store accepted the key.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: bool,
    /// Optional human-readable message.
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    /// Optional error code or detail.
    #[serde(default, deserialize_with = "lenient_string")]
    pub error: Option<String>,
    /// License payload on success.
    #[serde(default)]
    pub data: Option<ActivationData>,
}

/// License payload from an activation reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationData {
    /// Store product the key belongs to. Numbers and numeric strings are
    /// accepted; anything else reads as 0.
    #[serde(default, deserialize_with = "lenient_product_id")]
    pub product_id: i64,
    /// Expiry timestamp, verbatim.
    #[serde(default, deserialize_with = "lenient_string")]
    pub expires_at: Option<String>,
    /// Activation token, verbatim.
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: Option<String>,
}

impl ActivationResponse {
    /// Failure message the way the store phrases it.
    pub fn failure_message(&self) -> String {
        let mut msg = self
            .message
            .clone()
            .unwrap_or_else(|| "Activation failed (Unknown error).".to_string());
        if let Some(error) = &self.error {
            msg.push_str(&format!(" ({})", error));
        }
        msg
    }

    /// Product identifier carried in `data`, 0 when absent.
    pub fn product_id(&self) -> i64 {
        self.data.as_ref().map(|d| d.product_id).unwrap_or(0)
    }
}

/// Store reply to `licenses/check-update`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
    /// Whether the lookup succeeded.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: bool,
    /// Release information.
    #[serde(default)]
    pub data: Option<UpdateData>,
}

/// Release information from an update reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateData {
    /// Latest released version.
    #[serde(default)]
    pub version: Option<String>,
    /// Download URL of the package zip.
    #[serde(default)]
    pub package: Option<String>,
    /// Info page URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// Reply from a CAPTCHA siteverify endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteverifyResponse {
    /// Whether the token was accepted.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: bool,
    /// Provider error codes.
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
    /// Hostname the token was issued for.
    #[serde(default)]
    pub hostname: Option<String>,
}

/// Decode a JSON value into `T`, mapping failures to a protocol-shaped error.
pub fn decode<T: serde::de::DeserializeOwned>(status: u16, body: &Value) -> Result<T, ProError> {
    serde_json::from_value(body.clone()).map_err(|e| ProError::BadResponse {
        status,
        snippet: format!("unexpected payload shape: {}", e),
    })
}

fn lenient_product_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Bool(b) => i64::from(b),
        _ => 0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_bool() == Some(true))
}
