//! Cloudflare Turnstile.

use super::{
    escape_attr, missing_site_key_notice, siteverify, widget_wrapper, Captcha, CaptchaKind,
    CaptchaSubmission, RenderContext,
};
use crate::client::verifier::RemoteVerifier;
use crate::errors::CaptchaError;
use std::fmt;

/// Turnstile with its site key and secret.
#[derive(Clone)]
pub struct Turnstile {
    site_key: String,
    secret: String,
    verifier: RemoteVerifier,
}

impl Turnstile {
    /// Create the provider.
    pub fn new(site_key: &str, secret: &str, verifier: RemoteVerifier) -> Self {
        Self {
            site_key: site_key.to_string(),
            secret: secret.to_string(),
            verifier,
        }
    }
}

impl fmt::Debug for Turnstile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Turnstile")
            .field("site_key", &self.site_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Captcha for Turnstile {
    fn kind(&self) -> CaptchaKind {
        CaptchaKind::Turnstile
    }

    fn render(&self, ctx: &RenderContext) -> String {
        if self.site_key.is_empty() {
            return missing_site_key_notice(self.kind(), ctx);
        }
        widget_wrapper(&format!(
            "<div class=\"cf-turnstile\" data-sitekey=\"{}\"></div>",
            escape_attr(&self.site_key)
        ))
    }

    fn verify(&self, submission: &CaptchaSubmission) -> Result<(), CaptchaError> {
        siteverify(&self.verifier, self.kind(), &self.secret, submission)
    }

    // The script loads whenever Turnstile is active, even before a key is set.
    fn script_src(&self) -> Option<&'static str> {
        Some(self.kind().script_url())
    }
}
