//! Google reCAPTCHA v2 checkbox.

use super::{
    escape_attr, missing_site_key_notice, siteverify, widget_wrapper, Captcha, CaptchaKind,
    CaptchaSubmission, RenderContext,
};
use crate::client::verifier::RemoteVerifier;
use crate::errors::CaptchaError;
use crate::style::color::prefers_dark_widget;
use std::fmt;

/// reCAPTCHA with its site key and secret.
#[derive(Clone)]
pub struct Recaptcha {
    site_key: String,
    secret: String,
    verifier: RemoteVerifier,
}

impl Recaptcha {
    /// Create the provider.
    pub fn new(site_key: &str, secret: &str, verifier: RemoteVerifier) -> Self {
        Self {
            site_key: site_key.to_string(),
            secret: secret.to_string(),
            verifier,
        }
    }

    /// Widget theme for a login form with the given label colour.
    pub fn theme(label_text_color: Option<&str>) -> &'static str {
        match label_text_color {
            Some(color) if prefers_dark_widget(color) => "dark",
            _ => "light",
        }
    }
}

impl fmt::Debug for Recaptcha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recaptcha")
            .field("site_key", &self.site_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Captcha for Recaptcha {
    fn kind(&self) -> CaptchaKind {
        CaptchaKind::Recaptcha
    }

    fn render(&self, ctx: &RenderContext) -> String {
        if self.site_key.is_empty() {
            return missing_site_key_notice(self.kind(), ctx);
        }
        let theme = Self::theme(ctx.label_text_color.as_deref());
        widget_wrapper(&format!(
            "<div class=\"g-recaptcha\" data-sitekey=\"{}\" data-theme=\"{}\"></div>",
            escape_attr(&self.site_key),
            theme
        ))
    }

    fn verify(&self, submission: &CaptchaSubmission) -> Result<(), CaptchaError> {
        siteverify(&self.verifier, self.kind(), &self.secret, submission)
    }

    fn script_src(&self) -> Option<&'static str> {
        (!self.site_key.is_empty()).then(|| self.kind().script_url())
    }
}
