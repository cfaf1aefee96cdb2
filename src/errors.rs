//! Loginforge error types.

use crate::captcha::CaptchaKind;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Errors produced by license, update, settings and CAPTCHA operations.
#[derive(Debug, Clone, Error)]
pub enum ProError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Transport failure talking to a remote endpoint (DNS, connect, timeout).
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Remote endpoint answered with something that is not JSON.
    #[error("Server returned non-JSON response ({status}): {snippet}...")]
    BadResponse {
        /// HTTP status code of the response.
        status: u16,
        /// HTML-stripped, truncated body for diagnostics.
        snippet: String,
    },

    /// Store accepted the key but it belongs to another product.
    #[error("Invalid license key.")]
    InvalidProduct {
        /// Product identifier returned by the store.
        product_id: i64,
    },

    /// Store rejected the activation.
    #[error("{0}")]
    ActivationFailed(String),

    /// No license key was supplied.
    #[error("Please enter a key.")]
    MissingLicenseKey,

    /// Deactivation requested without a stored license.
    #[error("No active license found.")]
    NoLicense,

    /// Caller lacks administrative privileges.
    #[error("Permission denied.")]
    PermissionDenied,

    /// Pro feature used without a valid license.
    #[error("A valid Pro license is required.")]
    Unlicensed,

    /// Option store I/O error.
    #[error("Storage error: {0}")]
    StorageIO(String),

    /// Preset key is unknown.
    #[error("Preset not found.")]
    PresetNotFound,

    /// Preset name was empty after sanitisation.
    #[error("Please enter a preset name.")]
    EmptyPresetName,

    /// Attempt to delete a preset that ships with the crate.
    #[error("Cannot delete built-in presets.")]
    BuiltInPreset,

    /// Import document was rejected.
    #[error("{0}")]
    InvalidImport(String),

    /// CAPTCHA verification failed.
    #[error(transparent)]
    Captcha(#[from] CaptchaError),
}

impl ProError {
    /// Stable error kind for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError(_) => ErrorKind::ConfigError,
            Self::NetworkError(_) => ErrorKind::NetworkError,
            Self::BadResponse { .. } => ErrorKind::BadResponse,
            Self::InvalidProduct { .. } => ErrorKind::InvalidProduct,
            Self::ActivationFailed(_) => ErrorKind::ActivationFailed,
            Self::MissingLicenseKey => ErrorKind::MissingLicenseKey,
            Self::NoLicense => ErrorKind::NoLicense,
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::Unlicensed => ErrorKind::Unlicensed,
            Self::StorageIO(_) => ErrorKind::StorageError,
            Self::PresetNotFound | Self::EmptyPresetName | Self::BuiltInPreset => {
                ErrorKind::PresetError
            }
            Self::InvalidImport(_) => ErrorKind::ImportError,
            Self::Captcha(e) => ErrorKind::Captcha(e.kind, e.failure),
        }
    }
}

/// Machine-readable classification of a [`ProError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `network_error`
    NetworkError,
    /// `bad_response`
    BadResponse,
    /// `remote_rejected`: a well-formed reply with `success` not true
    RemoteRejected,
    /// `invalid_product`
    InvalidProduct,
    /// `activation_failed`
    ActivationFailed,
    /// `missing_license_key`
    MissingLicenseKey,
    /// `no_license`
    NoLicense,
    /// `permission_denied`
    PermissionDenied,
    /// `unlicensed`
    Unlicensed,
    /// `config_error`
    ConfigError,
    /// `storage_error`
    StorageError,
    /// `preset_error`
    PresetError,
    /// `import_error`
    ImportError,
    /// `{provider}_{failure}`, e.g. `turnstile_missing`
    Captcha(CaptchaKind, CaptchaFailure),
}

impl ErrorKind {
    /// Wire code for this kind.
    pub fn code(&self) -> Cow<'static, str> {
        let code = match self {
            Self::NetworkError => "network_error",
            Self::BadResponse => "bad_response",
            Self::RemoteRejected => "remote_rejected",
            Self::InvalidProduct => "invalid_product",
            Self::ActivationFailed => "activation_failed",
            Self::MissingLicenseKey => "missing_license_key",
            Self::NoLicense => "no_license",
            Self::PermissionDenied => "permission_denied",
            Self::Unlicensed => "unlicensed",
            Self::ConfigError => "config_error",
            Self::StorageError => "storage_error",
            Self::PresetError => "preset_error",
            Self::ImportError => "import_error",
            Self::Captcha(kind, failure) => {
                return Cow::Owned(format!("{}_{}", kind.slug(), failure.suffix()))
            }
        };
        Cow::Borrowed(code)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

/// Why a CAPTCHA check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptchaFailure {
    /// The visitor submitted no token.
    Missing,
    /// No secret configured; the check fails closed.
    ConfigError,
    /// The siteverify call failed or answered garbage.
    ApiError,
    /// The provider rejected the token.
    Failed,
}

impl CaptchaFailure {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::ConfigError => "config_error",
            Self::ApiError => "api_error",
            Self::Failed => "failed",
        }
    }
}

/// A provider-specific CAPTCHA failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptchaError {
    /// Provider that produced the failure.
    pub kind: CaptchaKind,
    /// Failure reason.
    pub failure: CaptchaFailure,
}

impl CaptchaError {
    /// Build a failure for `kind`.
    pub fn new(kind: CaptchaKind, failure: CaptchaFailure) -> Self {
        Self { kind, failure }
    }
}

impl fmt::Display for CaptchaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.failure {
            CaptchaFailure::Missing => self.kind.missing_message(),
            CaptchaFailure::ConfigError => "CAPTCHA configuration error.",
            CaptchaFailure::ApiError => "CAPTCHA validation failed (API error).",
            CaptchaFailure::Failed => "CAPTCHA validation failed.",
        };
        f.write_str(message)
    }
}

impl std::error::Error for CaptchaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_for_core_kinds() {
        assert_eq!(ProError::NoLicense.kind().code(), "no_license");
        assert_eq!(
            ProError::InvalidProduct { product_id: 7 }.kind().code(),
            "invalid_product"
        );
        assert_eq!(
            ProError::NetworkError("timed out".into()).kind().code(),
            "network_error"
        );
        assert_eq!(ErrorKind::RemoteRejected.code(), "remote_rejected");
    }

    #[test]
    fn test_captcha_codes_carry_provider_slug() {
        let err = ProError::from(CaptchaError::new(
            CaptchaKind::Turnstile,
            CaptchaFailure::ConfigError,
        ));
        assert_eq!(err.kind().code(), "turnstile_config_error");

        let err = CaptchaError::new(CaptchaKind::Recaptcha, CaptchaFailure::ApiError);
        assert_eq!(
            ErrorKind::Captcha(err.kind, err.failure).to_string(),
            "recaptcha_api_error"
        );
    }

    #[test]
    fn test_captcha_messages() {
        let missing = CaptchaError::new(CaptchaKind::Recaptcha, CaptchaFailure::Missing);
        assert_eq!(missing.to_string(), "Please complete the reCAPTCHA.");
        let missing = CaptchaError::new(CaptchaKind::Turnstile, CaptchaFailure::Missing);
        assert_eq!(missing.to_string(), "Please verify that you are human.");
    }

    #[test]
    fn test_bad_response_message_includes_snippet() {
        let err = ProError::BadResponse {
            status: 502,
            snippet: "Bad Gateway".into(),
        };
        assert_eq!(
            err.to_string(),
            "Server returned non-JSON response (502): Bad Gateway..."
        );
    }
}
