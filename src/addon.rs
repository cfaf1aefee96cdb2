//! `ProAddon`: the single entry point a host wires into its login page and
//! admin screens.
//!
//! Admin actions take a [`Viewer`] and refuse non-administrators. Pro
//! features additionally require a valid stored license.

use crate::captcha::{CaptchaConfig, CaptchaProvider, CaptchaSubmission, RenderContext};
use crate::client::http::{HttpTransport, ReqwestTransport};
use crate::client::verifier::{RemoteVerifier, VerificationResult};
use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::license::LicenseClient;
use crate::login;
use crate::presets::{AppliedPreset, PresetLibrary, PresetMap};
use crate::settings::transfer::{self, SettingsExport};
use crate::settings::Settings;
use crate::store::OptionStore;
use crate::style::generate_pro_css;
use crate::updater::UpdateChecker;
use crate::ProError;
use serde_json::Value;
use std::sync::Arc;

/// Who is asking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    /// Viewer may change site options.
    pub can_manage_options: bool,
}

impl Viewer {
    /// An administrator.
    pub fn admin() -> Self {
        Self {
            can_manage_options: true,
        }
    }

    /// An anonymous visitor.
    pub fn visitor() -> Self {
        Self::default()
    }

    fn require_admin(&self) -> Result<(), ProError> {
        if self.can_manage_options {
            Ok(())
        } else {
            Err(ProError::PermissionDenied)
        }
    }
}

/// A settings export ready to download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    /// Suggested filename.
    pub filename: String,
    /// Pretty-printed JSON document.
    pub contents: String,
    /// The document itself.
    pub document: SettingsExport,
}

/// Pro features over a host option store.
pub struct ProAddon {
    config: StoreConfig,
    store: Arc<dyn OptionStore>,
    clock: Arc<dyn Clock>,
    verifier: RemoteVerifier,
    license: LicenseClient,
    presets: PresetLibrary,
}

impl ProAddon {
    /// Create the add-on with a reqwest transport and the system clock.
    ///
    /// # Errors
    /// - `ConfigError` - Invalid configuration or HTTP client setup failure
    pub fn new(config: StoreConfig, store: Arc<dyn OptionStore>) -> Result<Self, ProError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::assemble(
            config,
            store,
            Arc::new(transport),
            Arc::new(SystemClock),
        ))
    }

    /// Create the add-on with a caller-supplied transport and clock.
    #[cfg(any(test, feature = "test-seams"))]
    pub fn with_parts(
        config: StoreConfig,
        store: Arc<dyn OptionStore>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ProError> {
        config.validate()?;
        Ok(Self::assemble(config, store, transport, clock))
    }

    fn assemble(
        config: StoreConfig,
        store: Arc<dyn OptionStore>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let verifier = RemoteVerifier::new(transport);
        let license = LicenseClient::new(&config, verifier.clone(), store.clone());
        let presets = PresetLibrary::new(store.clone(), clock.clone());
        Self {
            config,
            store,
            clock,
            verifier,
            license,
            presets,
        }
    }

    /// The license client.
    pub fn license(&self) -> &LicenseClient {
        &self.license
    }

    /// `true` when a valid license is stored.
    pub fn is_pro_active(&self) -> bool {
        self.license.status().is_valid()
    }

    fn require_pro(&self) -> Result<(), ProError> {
        if self.is_pro_active() {
            Ok(())
        } else {
            Err(ProError::Unlicensed)
        }
    }

    /// Activate a license key on behalf of an administrator.
    pub fn activate_license(&self, viewer: Viewer, license_key: &str) -> VerificationResult {
        VerificationResult::from_outcome(viewer.require_admin().and_then(|()| {
            let response = self.license.activate(license_key)?;
            Ok(response
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "License activated successfully.".to_string()))
        }))
    }

    /// Deactivate the stored license on behalf of an administrator.
    ///
    /// Succeeds once the local record is gone, whether or not the store
    /// confirmed.
    pub fn deactivate_license(&self, viewer: Viewer) -> VerificationResult {
        VerificationResult::from_outcome(viewer.require_admin().and_then(|()| {
            let outcome = self.license.deactivate()?;
            Ok(if outcome.confirmed() {
                "License deactivated.".to_string()
            } else {
                "License removed from this site; the store did not confirm.".to_string()
            })
        }))
    }

    /// Current settings.
    pub fn settings(&self) -> Result<Settings, ProError> {
        Settings::load(self.store.as_ref())
    }

    /// Sanitise and persist submitted settings.
    pub fn save_settings(&self, viewer: Viewer, input: &Value) -> Result<Settings, ProError> {
        viewer.require_admin()?;
        let settings = Settings::sanitize(input);
        settings.save(self.store.as_ref())?;
        Ok(settings)
    }

    /// Login page CSS for the Pro settings. Empty without a license.
    pub fn pro_css(&self) -> String {
        if !self.is_pro_active() {
            return String::new();
        }
        match self.settings() {
            Ok(settings) => generate_pro_css(&settings),
            Err(e) => {
                tracing::warn!(error = %e, "settings unreadable, skipping Pro CSS");
                String::new()
            }
        }
    }

    /// Built-in and saved presets.
    pub fn presets(&self, viewer: Viewer) -> Result<PresetMap, ProError> {
        viewer.require_admin()?;
        self.require_pro()?;
        self.presets.all()
    }

    /// Preview preset `key` merged onto the current settings.
    pub fn apply_preset(&self, viewer: Viewer, key: &str) -> Result<AppliedPreset, ProError> {
        viewer.require_admin()?;
        self.require_pro()?;
        self.presets.apply(key, &self.settings()?)
    }

    /// Save the current styling as a preset named `name`.
    pub fn save_preset(&self, viewer: Viewer, name: &str) -> Result<String, ProError> {
        viewer.require_admin()?;
        self.require_pro()?;
        self.presets.save(name, &self.settings()?)
    }

    /// Delete a saved preset.
    pub fn delete_preset(&self, viewer: Viewer, key: &str) -> Result<(), ProError> {
        viewer.require_admin()?;
        self.require_pro()?;
        self.presets.delete(key)
    }

    /// Export settings and saved presets.
    pub fn export_settings(&self, viewer: Viewer) -> Result<ExportFile, ProError> {
        viewer.require_admin()?;
        self.require_pro()?;

        let document = transfer::export(
            &self.settings()?,
            &self.presets.custom()?,
            self.clock.as_ref(),
            &self.config.current_version,
        );
        Ok(ExportFile {
            filename: transfer::export_filename(self.clock.as_ref()),
            contents: document.to_json()?,
            document,
        })
    }

    /// Import an uploaded export, replacing settings and, when present,
    /// saved presets.
    pub fn import_settings(
        &self,
        viewer: Viewer,
        filename: &str,
        contents: &str,
    ) -> Result<Settings, ProError> {
        viewer.require_admin()?;
        self.require_pro()?;

        let imported = transfer::import(filename, contents)?;
        imported.settings.save(self.store.as_ref())?;
        if let Some(presets) = &imported.custom_presets {
            self.presets.replace_custom(presets)?;
        }
        tracing::info!("settings imported");
        Ok(imported.settings)
    }

    /// Stored CAPTCHA configuration.
    pub fn captcha_config(&self) -> Result<CaptchaConfig, ProError> {
        CaptchaConfig::load(self.store.as_ref())
    }

    /// Replace the CAPTCHA configuration.
    pub fn save_captcha_config(
        &self,
        viewer: Viewer,
        config: &CaptchaConfig,
    ) -> Result<(), ProError> {
        viewer.require_admin()?;
        config.save(self.store.as_ref())
    }

    /// Active CAPTCHA provider; none without a license.
    pub fn captcha_provider(&self) -> CaptchaProvider {
        if !self.is_pro_active() {
            return CaptchaProvider::None;
        }
        match self.captcha_config() {
            Ok(config) => CaptchaProvider::from_config(&config, self.verifier.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "CAPTCHA settings unreadable");
                CaptchaProvider::None
            }
        }
    }

    /// CAPTCHA widget markup for the login form.
    pub fn render_captcha(&self, viewer: Viewer) -> String {
        let provider = self.captcha_provider();
        if provider.kind().is_none() {
            return String::new();
        }
        let label_text_color = self
            .settings()
            .ok()
            .and_then(|s| s.design_str("label_text_color").map(str::to_string));
        provider.render(&RenderContext {
            can_manage_options: viewer.can_manage_options,
            label_text_color,
        })
    }

    /// Client script the login page must load for the CAPTCHA, if any.
    pub fn captcha_script(&self) -> Option<&'static str> {
        self.captcha_provider().script_src()
    }

    /// Check the CAPTCHA on a login submission.
    pub fn validate_login(&self, submission: &CaptchaSubmission) -> VerificationResult {
        self.captcha_provider()
            .validate(VerificationResult::ok("OK"), submission)
    }

    /// Custom message markup below the login form.
    pub fn custom_message(&self) -> Option<String> {
        if !self.is_pro_active() {
            return None;
        }
        login::render_custom_message(&self.settings().ok()?)
    }

    /// Redirect target after a login attempt.
    pub fn login_redirect(&self, requested: &str, authenticated: bool) -> String {
        match self.settings() {
            Ok(settings) if self.is_pro_active() => {
                login::login_redirect(&settings, requested, authenticated)
            }
            _ => requested.to_string(),
        }
    }

    /// Redirect target after logout, `None` for the host default.
    pub fn logout_redirect(&self) -> Option<String> {
        if !self.is_pro_active() {
            return None;
        }
        let settings = self.settings().ok()?;
        login::logout_redirect(&settings).map(str::to_string)
    }

    /// Update checker for the stored license key, if any.
    pub fn updater(&self) -> Option<UpdateChecker> {
        let key = self.license.license_key();
        if key.is_empty() {
            return None;
        }
        Some(UpdateChecker::new(self.verifier.clone(), &self.config, key))
    }
}
