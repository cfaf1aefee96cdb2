//! Store connection configuration.

use crate::ProError;
use std::fmt;
use std::time::Duration;

/// Store-side product identifier this build is licensed for.
pub const PRODUCT_ID: i64 = 61;

/// Default plugin slug reported to the update endpoint.
pub const DEFAULT_SLUG: &str = "loginforge-pro";

/// Upper bound on every outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Environment variable holding the store consumer key.
pub const ENV_CONSUMER_KEY: &str = "LOGINFORGE_STORE_KEY";

/// Environment variable holding the store consumer secret.
pub const ENV_CONSUMER_SECRET: &str = "LOGINFORGE_STORE_SECRET";

/// Credential pair for the store's license API.
///
/// These are never compiled into the crate. Point them at a server-side
/// broker rather than shipping a store admin key to every site.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreCredentials {
    /// Consumer key (Basic auth user).
    pub consumer_key: String,
    /// Consumer secret (Basic auth password).
    pub consumer_secret: String,
}

impl StoreCredentials {
    /// Build a credential pair.
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Read the credential pair from `LOGINFORGE_STORE_KEY` / `LOGINFORGE_STORE_SECRET`.
    pub fn from_env() -> Result<Self, ProError> {
        let read = |name: &str| {
            std::env::var(name)
                .map_err(|_| ProError::ConfigError(format!("{} must be set", name)))
        };
        Ok(Self::new(read(ENV_CONSUMER_KEY)?, read(ENV_CONSUMER_SECRET)?))
    }
}

impl fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

/// Certificate verification policy for outbound HTTPS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsPolicy {
    /// Verify certificates (always the default).
    #[default]
    Verified,

    /// Accept any certificate. Local development only; requires the
    /// `insecure-tls` feature.
    #[cfg(feature = "insecure-tls")]
    AcceptInvalidCerts,
}

/// Configuration for talking to the license/update store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store base URL, e.g. `https://store.example.com`.
    pub store_url: String,

    /// Product identifier the store must report on activation.
    pub product_id: i64,

    /// Slug sent to the update endpoint.
    pub plugin_slug: String,

    /// Version of the installed Pro package.
    pub current_version: String,

    /// Host application name, used in the User-Agent.
    pub app_name: String,

    /// User-Agent product identifier.
    pub user_agent_product: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Certificate verification policy.
    pub tls: TlsPolicy,

    /// Store API credentials.
    pub credentials: StoreCredentials,
}

impl StoreConfig {
    /// Configuration with defaults for everything but the store and credentials.
    pub fn new(store_url: impl Into<String>, credentials: StoreCredentials) -> Self {
        Self {
            store_url: store_url.into(),
            product_id: PRODUCT_ID,
            plugin_slug: DEFAULT_SLUG.to_string(),
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            app_name: "loginforge".to_string(),
            user_agent_product: "loginforge-pro".to_string(),
            timeout: DEFAULT_TIMEOUT,
            tls: TlsPolicy::default(),
            credentials,
        }
    }

    /// Store URL without a trailing slash.
    pub fn store_base(&self) -> &str {
        self.store_url.trim_end_matches('/')
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), ProError> {
        let parsed = url::Url::parse(&self.store_url)
            .map_err(|e| ProError::ConfigError(format!("store_url is not a valid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProError::ConfigError(format!(
                "store_url must be http or https, got {}",
                parsed.scheme()
            )));
        }
        if self.credentials.consumer_key.is_empty() || self.credentials.consumer_secret.is_empty() {
            return Err(ProError::ConfigError(
                "store credentials cannot be empty".to_string(),
            ));
        }
        if self.plugin_slug.is_empty() {
            return Err(ProError::ConfigError(
                "plugin_slug cannot be empty".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ProError::ConfigError("timeout cannot be zero".to_string()));
        }
        Ok(())
    }
}
