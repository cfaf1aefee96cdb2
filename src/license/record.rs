//! Persisted license record.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status string the store record carries when Pro is licensed.
pub const STATUS_VALID: &str = "valid";

/// Local license status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// A record exists with status `valid`.
    Valid,
    /// Anything else.
    Invalid,
}

impl LicenseStatus {
    /// `"valid"` or `"invalid"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }

    /// `true` for [`LicenseStatus::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// The single stored license record.
///
/// Fields are kept loosely typed so records written by older builds, or
/// edited by hand, still parse; [`LicenseRecord::status`] decides validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Activated license key.
    pub key: String,

    /// Status string, `"valid"` after activation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Expiry as returned by the store (verbatim, may be empty).
    #[serde(default)]
    pub expiry: String,

    /// Activation token as returned by the store (verbatim, may be empty).
    #[serde(default)]
    pub activation_token: String,
}

impl LicenseRecord {
    /// Record for a freshly activated key.
    pub fn activated(key: &str, expiry: Option<String>, token: Option<String>) -> Self {
        Self {
            key: key.to_string(),
            status: Some(STATUS_VALID.to_string()),
            expiry: expiry.unwrap_or_default(),
            activation_token: token.unwrap_or_default(),
        }
    }

    /// Status derived from the stored string; only exactly `"valid"` counts.
    pub fn status(&self) -> LicenseStatus {
        match self.status.as_deref() {
            Some(STATUS_VALID) => LicenseStatus::Valid,
            _ => LicenseStatus::Invalid,
        }
    }

    /// Parsed expiry, for display. Not used to gate features.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        parse_store_timestamp(&self.expiry)
    }
}

/// Parse RFC 3339 or `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn parse_store_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Short SHA-256 fingerprint of a license key, safe to log.
pub fn key_fingerprint(license_key: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(license_key.as_bytes());
    hex::encode(&hash[..6])
}
