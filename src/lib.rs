//! # Loginforge
//!
//! **Pro tier of a login page designer: store licensing, update checks,
//! presets, generated CSS, settings transfer and login CAPTCHAs.**
//!
//! The host application owns the login page and its option storage; this
//! crate plugs into both through [`ProAddon`].
//!
//! ## Features
//!
//! - **Store licensing** - activate and deactivate keys against a License
//!   Manager for WooCommerce store; activation is bound to one product id
//! - **Update checks** - ask the store whether a newer package exists
//! - **Presets** - built-in design presets plus user-saved ones
//! - **Pro CSS** - glass forms, nine-position layout, spacing, footer links
//! - **Import/export** - sanitised JSON round trips of settings and presets
//! - **CAPTCHA** - Google reCAPTCHA v2 or Cloudflare Turnstile, failing
//!   closed on misconfiguration
//!
//! ## Quickstart
//!
//! ```no_run
//! use loginforge::{FileStore, ProAddon, StoreConfig, StoreCredentials, Viewer};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), loginforge::ProError> {
//!     let config = StoreConfig::new("https://store.example.com", StoreCredentials::from_env()?);
//!     let store = Arc::new(FileStore::new("loginforge")?);
//!     let addon = ProAddon::new(config, store)?;
//!
//!     let result = addon.activate_license(Viewer::admin(), "LICENSE-KEY-HERE");
//!     println!("{}: {}", result.success, result.message);
//!
//!     if addon.is_pro_active() {
//!         println!("{}", addon.pro_css());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Security notes
//!
//! - Store credentials are injected (or read from the environment), never
//!   compiled in.
//! - TLS certificates are verified unless the crate is built with the
//!   `insecure-tls` feature *and* the host opts in.
//! - License keys appear in logs only as a short SHA-256 fingerprint.
//! - CAPTCHA checks fail closed: no secret, no login.

#![warn(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Storage layer
pub mod store;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Licensing and updates
pub mod license;
pub mod updater;

// Design layer
pub mod login;
pub mod presets;
pub mod settings;
pub mod style;

// Login security
pub mod captcha;

// Facade (main public API)
pub mod addon;

// Re-exports for public API
pub use addon::{ExportFile, ProAddon, Viewer};
pub use captcha::{
    validate_chain, Captcha, CaptchaConfig, CaptchaKind, CaptchaMethod, CaptchaProvider,
    CaptchaSubmission, RenderContext,
};
pub use client::http::{HttpTransport, ReqwestTransport};
pub use client::verifier::{RemoteVerifier, VerificationResult};
pub use clock::{Clock, SystemClock};
pub use config::{StoreConfig, StoreCredentials, TlsPolicy};
pub use errors::{CaptchaError, CaptchaFailure, ErrorKind, ProError};
pub use license::{Deactivation, LicenseClient, LicenseRecord, LicenseStatus, RemoteAck};
pub use presets::{Preset, PresetLibrary};
pub use settings::Settings;
pub use store::{FileStore, MemoryStore, OptionStore};
pub use style::generate_pro_css;
pub use updater::{UpdateChecker, UpdateInfo};

#[cfg(any(test, feature = "test-seams"))]
pub use client::http::MockTransport;
#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
