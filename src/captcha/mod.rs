//! Login CAPTCHA providers.
//!
//! At most one provider is active. Rendering emits the widget markup for the
//! login form; validation posts the submitted token to the provider's
//! siteverify endpoint and fails closed on anything but an explicit
//! `success: true`.

pub mod recaptcha;
pub mod turnstile;

pub use recaptcha::Recaptcha;
pub use turnstile::Turnstile;

use crate::client::verifier::{RemoteVerifier, VerificationResult};
use crate::errors::{CaptchaError, CaptchaFailure};
use crate::protocol::models::{decode, SiteverifyResponse};
use crate::settings::sanitize::truthy;
use crate::store::{OptionStore, SECURITY_OPTION};
use crate::ProError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A CAPTCHA provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaKind {
    /// Google reCAPTCHA v2 checkbox.
    Recaptcha,
    /// Cloudflare Turnstile.
    Turnstile,
}

impl CaptchaKind {
    /// Prefix of this provider's error codes.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Recaptcha => "recaptcha",
            Self::Turnstile => "turnstile",
        }
    }

    /// Name shown to administrators.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Recaptcha => "reCAPTCHA",
            Self::Turnstile => "Turnstile",
        }
    }

    /// Form field carrying the widget token.
    pub fn response_field(&self) -> &'static str {
        match self {
            Self::Recaptcha => "g-recaptcha-response",
            Self::Turnstile => "cf-turnstile-response",
        }
    }

    /// Server-side verification endpoint.
    pub fn verify_url(&self) -> &'static str {
        match self {
            Self::Recaptcha => "https://www.google.com/recaptcha/api/siteverify",
            Self::Turnstile => "https://challenges.cloudflare.com/turnstile/v0/siteverify",
        }
    }

    /// Client script the login page must load.
    pub fn script_url(&self) -> &'static str {
        match self {
            Self::Recaptcha => "https://www.google.com/recaptcha/api.js",
            Self::Turnstile => "https://challenges.cloudflare.com/turnstile/v0/api.js",
        }
    }

    /// Message shown when the visitor submitted no token.
    pub fn missing_message(&self) -> &'static str {
        match self {
            Self::Recaptcha => "Please complete the reCAPTCHA.",
            Self::Turnstile => "Please verify that you are human.",
        }
    }
}

/// Provider selected in the security settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaMethod {
    /// No CAPTCHA.
    #[default]
    None,
    /// Google reCAPTCHA.
    Recaptcha,
    /// Cloudflare Turnstile.
    Turnstile,
}

impl CaptchaMethod {
    /// Provider for this method.
    pub fn kind(&self) -> Option<CaptchaKind> {
        match self {
            Self::None => None,
            Self::Recaptcha => Some(CaptchaKind::Recaptcha),
            Self::Turnstile => Some(CaptchaKind::Turnstile),
        }
    }
}

impl<'de> Deserialize<'de> for CaptchaMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str() {
            Some("recaptcha") => Self::Recaptcha,
            Some("turnstile") => Self::Turnstile,
            _ => Self::None,
        })
    }
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(truthy(&Value::deserialize(deserializer)?))
}

/// Security settings controlling the login CAPTCHA.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Selected provider.
    pub method: CaptchaMethod,
    /// Master switch.
    #[serde(deserialize_with = "lenient_flag")]
    pub enabled: bool,
    /// reCAPTCHA public site key.
    pub recaptcha_site_key: String,
    /// reCAPTCHA secret.
    pub recaptcha_secret: String,
    /// Turnstile public site key.
    pub turnstile_site_key: String,
    /// Turnstile secret.
    pub turnstile_secret: String,
}

impl std::fmt::Debug for CaptchaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaConfig")
            .field("method", &self.method)
            .field("enabled", &self.enabled)
            .field("recaptcha_site_key", &self.recaptcha_site_key)
            .field("recaptcha_secret", &"<redacted>")
            .field("turnstile_site_key", &self.turnstile_site_key)
            .field("turnstile_secret", &"<redacted>")
            .finish()
    }
}

impl CaptchaConfig {
    /// Method in effect: the selected one when enabled, else none.
    pub fn active_method(&self) -> CaptchaMethod {
        if self.enabled {
            self.method
        } else {
            CaptchaMethod::None
        }
    }

    /// Load from the security settings option. Defaults when absent.
    pub fn load(store: &dyn OptionStore) -> Result<Self, ProError> {
        Ok(crate::store::load_option(store, SECURITY_OPTION)?.unwrap_or_default())
    }

    /// Persist to the security settings option.
    pub fn save(&self, store: &dyn OptionStore) -> Result<(), ProError> {
        crate::store::save_option(store, SECURITY_OPTION, self)
    }
}

/// Fields of a login form submission.
#[derive(Debug, Clone, Default)]
pub struct CaptchaSubmission {
    /// Posted form fields.
    pub fields: BTreeMap<String, String>,
    /// Visitor address, forwarded to the provider when known.
    pub remote_ip: Option<String>,
}

impl CaptchaSubmission {
    /// Empty submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a posted field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set the visitor address.
    pub fn with_remote_ip(mut self, ip: impl Into<String>) -> Self {
        self.remote_ip = Some(ip.into());
        self
    }

    /// Posted value of `name`, empty when absent.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// What the renderer needs to know about the page and the viewer.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Viewer may see configuration errors.
    pub can_manage_options: bool,
    /// Label colour of the login form, used to pick a widget theme.
    pub label_text_color: Option<String>,
}

/// A CAPTCHA provider integration.
pub trait Captcha: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> CaptchaKind;

    /// Widget markup for the login form.
    fn render(&self, ctx: &RenderContext) -> String;

    /// Check the token in `submission`.
    fn verify(&self, submission: &CaptchaSubmission) -> Result<(), CaptchaError>;

    /// Client script to load, if the widget can render.
    fn script_src(&self) -> Option<&'static str>;
}

/// Notice shown instead of the widget when the site key is missing.
pub(crate) fn missing_site_key_notice(kind: CaptchaKind, ctx: &RenderContext) -> String {
    if !ctx.can_manage_options {
        return String::new();
    }
    format!(
        "<p style=\"color:red; background:white; padding:10px; border:1px solid red;\">Error: {} Site Key is missing.</p>",
        kind.display_name()
    )
}

/// Centred wrapper around the widget element.
pub(crate) fn widget_wrapper(inner: &str) -> String {
    format!(
        "<div style=\"display:flex; justify-content:center; width:100%; margin: 16px 0;\">{}</div>",
        inner
    )
}

/// Attribute-safe rendering of a configured value.
pub(crate) fn escape_attr(value: &str) -> String {
    ammonia::clean_text(value)
}

/// Post the submitted token to the provider and require `success: true`.
///
/// Empty token and empty secret fail without a network call.
pub(crate) fn siteverify(
    verifier: &RemoteVerifier,
    kind: CaptchaKind,
    secret: &str,
    submission: &CaptchaSubmission,
) -> Result<(), CaptchaError> {
    let fail = |failure| CaptchaError::new(kind, failure);

    let token = submission.field(kind.response_field());
    if token.is_empty() {
        return Err(fail(CaptchaFailure::Missing));
    }
    if secret.is_empty() {
        tracing::warn!(provider = kind.slug(), "CAPTCHA secret not configured");
        return Err(fail(CaptchaFailure::ConfigError));
    }

    let form = vec![
        ("secret".to_string(), secret.to_string()),
        ("response".to_string(), token.to_string()),
        (
            "remoteip".to_string(),
            submission.remote_ip.clone().unwrap_or_default(),
        ),
    ];

    let reply = verifier.post_form(kind.verify_url(), form).map_err(|e| {
        tracing::warn!(provider = kind.slug(), error = %e, "siteverify call failed");
        fail(CaptchaFailure::ApiError)
    })?;

    let response: SiteverifyResponse = decode(reply.status, &reply.body).map_err(|e| {
        tracing::warn!(provider = kind.slug(), error = %e, "siteverify reply unreadable");
        fail(CaptchaFailure::ApiError)
    })?;

    if !response.success {
        tracing::info!(
            provider = kind.slug(),
            codes = ?response.error_codes,
            "CAPTCHA token rejected"
        );
        return Err(fail(CaptchaFailure::Failed));
    }

    tracing::debug!(provider = kind.slug(), "CAPTCHA token accepted");
    Ok(())
}

/// The active login CAPTCHA.
#[derive(Debug, Clone, Default)]
pub enum CaptchaProvider {
    /// No CAPTCHA on the login form.
    #[default]
    None,
    /// Google reCAPTCHA.
    Recaptcha(Recaptcha),
    /// Cloudflare Turnstile.
    Turnstile(Turnstile),
}

impl CaptchaProvider {
    /// Provider for the method `config` has in effect.
    pub fn from_config(config: &CaptchaConfig, verifier: RemoteVerifier) -> Self {
        match config.active_method() {
            CaptchaMethod::None => Self::None,
            CaptchaMethod::Recaptcha => Self::Recaptcha(Recaptcha::new(
                &config.recaptcha_site_key,
                &config.recaptcha_secret,
                verifier,
            )),
            CaptchaMethod::Turnstile => Self::Turnstile(Turnstile::new(
                &config.turnstile_site_key,
                &config.turnstile_secret,
                verifier,
            )),
        }
    }

    /// The provider as a trait object.
    pub fn as_captcha(&self) -> Option<&dyn Captcha> {
        match self {
            Self::None => None,
            Self::Recaptcha(c) => Some(c as &dyn Captcha),
            Self::Turnstile(c) => Some(c as &dyn Captcha),
        }
    }

    /// Provider kind, if any.
    pub fn kind(&self) -> Option<CaptchaKind> {
        self.as_captcha().map(|c| c.kind())
    }

    /// Widget markup; empty when no provider is active.
    pub fn render(&self, ctx: &RenderContext) -> String {
        self.as_captcha().map(|c| c.render(ctx)).unwrap_or_default()
    }

    /// Client script to load, if any.
    pub fn script_src(&self) -> Option<&'static str> {
        self.as_captcha().and_then(|c| c.script_src())
    }

    /// Validate `submission` unless an earlier check already failed.
    pub fn validate(
        &self,
        prior: VerificationResult,
        submission: &CaptchaSubmission,
    ) -> VerificationResult {
        if prior.is_failure() {
            return prior;
        }
        let Some(captcha) = self.as_captcha() else {
            return prior;
        };
        match captcha.verify(submission) {
            Ok(()) => prior,
            Err(e) => VerificationResult::from_error(&ProError::from(e)),
        }
    }
}

/// Run each provider in turn; the first failure wins.
pub fn validate_chain(
    providers: &[CaptchaProvider],
    submission: &CaptchaSubmission,
) -> VerificationResult {
    providers
        .iter()
        .fold(VerificationResult::ok("OK"), |prior, provider| {
            provider.validate(prior, submission)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::http::{Method, MockTransport};
    use crate::errors::ErrorKind;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn verifier() -> (Arc<MockTransport>, RemoteVerifier) {
        let mock = Arc::new(MockTransport::new());
        (mock.clone(), RemoteVerifier::new(mock))
    }

    fn config(method: CaptchaMethod, enabled: bool) -> CaptchaConfig {
        CaptchaConfig {
            method,
            enabled,
            recaptcha_site_key: "rc-site".into(),
            recaptcha_secret: "rc-secret".into(),
            turnstile_site_key: "ts-site".into(),
            turnstile_secret: "ts-secret".into(),
        }
    }

    fn turnstile_submission(token: &str) -> CaptchaSubmission {
        CaptchaSubmission::new()
            .with_field("cf-turnstile-response", token)
            .with_remote_ip("203.0.113.9")
    }

    #[test]
    fn test_active_method_requires_enabled() {
        assert_eq!(
            config(CaptchaMethod::Turnstile, false).active_method(),
            CaptchaMethod::None
        );
        assert_eq!(
            config(CaptchaMethod::Turnstile, true).active_method(),
            CaptchaMethod::Turnstile
        );

        let (_, v) = verifier();
        let provider = CaptchaProvider::from_config(&config(CaptchaMethod::Recaptcha, false), v);
        assert!(provider.kind().is_none());
        assert_eq!(provider.render(&RenderContext::default()), "");
        assert!(provider.script_src().is_none());
    }

    #[test]
    fn test_config_load_is_lenient() {
        let store = MemoryStore::new();
        assert_eq!(CaptchaConfig::load(&store).unwrap(), CaptchaConfig::default());

        store
            .set(
                SECURITY_OPTION,
                &json!({"method": "turnstile", "enabled": "1", "turnstile_site_key": "k"}),
            )
            .unwrap();
        let loaded = CaptchaConfig::load(&store).unwrap();
        assert_eq!(loaded.active_method(), CaptchaMethod::Turnstile);
        assert_eq!(loaded.turnstile_site_key, "k");

        store
            .set(SECURITY_OPTION, &json!({"method": "hcaptcha", "enabled": true}))
            .unwrap();
        assert_eq!(
            CaptchaConfig::load(&store).unwrap().active_method(),
            CaptchaMethod::None
        );
    }

    #[test]
    fn test_config_debug_redacts_secrets() {
        let debug = format!("{:?}", config(CaptchaMethod::Recaptcha, true));
        assert!(!debug.contains("rc-secret"));
        assert!(!debug.contains("ts-secret"));
        assert!(debug.contains("rc-site"));
    }

    #[test]
    fn test_missing_token_makes_no_call() {
        let (mock, v) = verifier();
        let provider = CaptchaProvider::from_config(&config(CaptchaMethod::Turnstile, true), v);

        let result = provider.validate(VerificationResult::ok("OK"), &turnstile_submission(""));
        assert_eq!(result.error_code().as_deref(), Some("turnstile_missing"));
        assert_eq!(result.message, "Please verify that you are human.");
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_missing_secret_fails_closed() {
        let (mock, v) = verifier();
        let mut cfg = config(CaptchaMethod::Turnstile, true);
        cfg.turnstile_secret.clear();
        let provider = CaptchaProvider::from_config(&cfg, v);

        let result =
            provider.validate(VerificationResult::ok("OK"), &turnstile_submission("tok"));
        assert_eq!(result.error_code().as_deref(), Some("turnstile_config_error"));
        assert_eq!(result.message, "CAPTCHA configuration error.");
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_siteverify_request() {
        let (mock, v) = verifier();
        mock.push_response(200, r#"{"success":true,"hostname":"example.com"}"#);
        let provider = CaptchaProvider::from_config(&config(CaptchaMethod::Turnstile, true), v);

        let result =
            provider.validate(VerificationResult::ok("OK"), &turnstile_submission("tok"));
        assert!(result.success);

        let request = &mock.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, CaptchaKind::Turnstile.verify_url());
        assert_eq!(request.form_value("secret"), Some("ts-secret"));
        assert_eq!(request.form_value("response"), Some("tok"));
        assert_eq!(request.form_value("remoteip"), Some("203.0.113.9"));
    }

    #[test]
    fn test_rejected_token() {
        let (mock, v) = verifier();
        mock.push_response(200, r#"{"success":false,"error-codes":["invalid-input-response"]}"#);
        let provider = CaptchaProvider::from_config(&config(CaptchaMethod::Turnstile, true), v);

        let result =
            provider.validate(VerificationResult::ok("OK"), &turnstile_submission("tok"));
        assert_eq!(result.error_code().as_deref(), Some("turnstile_failed"));
        assert_eq!(result.message, "CAPTCHA validation failed.");
    }

    #[test]
    fn test_api_errors() {
        let (mock, v) = verifier();
        mock.push_network_error("connection refused");
        mock.push_response(502, "<html><body>Bad gateway</body></html>");
        let provider = CaptchaProvider::from_config(&config(CaptchaMethod::Turnstile, true), v);

        for _ in 0..2 {
            let result =
                provider.validate(VerificationResult::ok("OK"), &turnstile_submission("tok"));
            assert_eq!(
                result.error_kind,
                Some(ErrorKind::Captcha(CaptchaKind::Turnstile, CaptchaFailure::ApiError))
            );
            assert_eq!(result.message, "CAPTCHA validation failed (API error).");
        }
    }

    #[test]
    fn test_prior_failure_short_circuits() {
        let (mock, v) = verifier();
        let provider = CaptchaProvider::from_config(&config(CaptchaMethod::Turnstile, true), v);
        let prior = VerificationResult::failure(ErrorKind::PermissionDenied, "earlier");

        let result = provider.validate(prior.clone(), &turnstile_submission("tok"));
        assert_eq!(result, prior);
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_chain_first_failure_wins() {
        let (mock, v) = verifier();
        let recaptcha =
            CaptchaProvider::from_config(&config(CaptchaMethod::Recaptcha, true), v.clone());
        let turnstile = CaptchaProvider::from_config(&config(CaptchaMethod::Turnstile, true), v);

        let result = validate_chain(
            &[CaptchaProvider::None, recaptcha, turnstile],
            &turnstile_submission("tok"),
        );
        assert_eq!(result.error_code().as_deref(), Some("recaptcha_missing"));
        assert_eq!(mock.call_count(), 0);

        assert!(validate_chain(&[], &CaptchaSubmission::new()).success);
    }
}
