//! Update checks against the store.

use crate::client::verifier::RemoteVerifier;
use crate::config::StoreConfig;
use crate::protocol::models::{decode, UpdateResponse};
use std::cmp::Ordering;
use url::Url;

/// Release information for the installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    /// Package slug.
    pub slug: String,
    /// Latest version the store offers.
    pub new_version: String,
    /// Download URL of the package.
    pub package: String,
    /// Info page URL.
    pub url: String,
}

/// Queries the store for newer releases of the Pro package.
pub struct UpdateChecker {
    verifier: RemoteVerifier,
    config: StoreConfig,
    license_key: String,
}

impl UpdateChecker {
    /// Create a checker for the given license key.
    pub fn new(verifier: RemoteVerifier, config: &StoreConfig, license_key: impl Into<String>) -> Self {
        Self {
            verifier,
            config: config.clone(),
            license_key: license_key.into(),
        }
    }

    /// Ask the store for the latest release. Any failure reads as "no info".
    pub fn request_info(&self) -> Option<UpdateInfo> {
        let url = match self.check_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "cannot build update URL");
                return None;
            }
        };

        let reply = match self.verifier.get_json(&url, None) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "update check failed");
                return None;
            }
        };

        if reply.status != 200 {
            tracing::warn!(status = reply.status, "update check rejected");
            return None;
        }

        let response: UpdateResponse = decode(reply.status, &reply.body).ok()?;
        if !response.success {
            return None;
        }

        let data = response.data.unwrap_or_default();
        Some(UpdateInfo {
            slug: self.config.plugin_slug.clone(),
            new_version: data.version.unwrap_or_else(|| "0.0.0".to_string()),
            package: data.package.unwrap_or_default(),
            url: data.url.unwrap_or_else(|| self.config.store_base().to_string()),
        })
    }

    /// Release info when the store offers something newer than the installed version.
    pub fn check_update(&self) -> Option<UpdateInfo> {
        let info = self.request_info()?;
        if compare_versions(&self.config.current_version, &info.new_version) == Ordering::Less {
            tracing::info!(
                current = %self.config.current_version,
                available = %info.new_version,
                "update available"
            );
            Some(info)
        } else {
            None
        }
    }

    /// Release info for the "view details" screen of `slug`.
    pub fn plugin_information(&self, slug: &str) -> Option<UpdateInfo> {
        if slug != self.config.plugin_slug {
            return None;
        }
        self.request_info()
    }

    fn check_url(&self) -> Result<String, url::ParseError> {
        let base = format!("{}/wp-json/lmfwc/v2/licenses/check-update", self.config.store_base());
        let url = Url::parse_with_params(
            &base,
            &[
                ("mf_action", "get_version"),
                ("license", self.license_key.as_str()),
                ("slug", self.config.plugin_slug.as_str()),
            ],
        )?;
        Ok(url.into())
    }
}

/// Compare dotted version strings numerically (`1.10.0 > 1.9.2`).
///
/// Missing components count as zero; anything after the leading digits of a
/// component (`-beta`, `rc1`) is ignored.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.trim()
            .trim_start_matches(['v', 'V'])
            .split('.')
            .map(|part| {
                let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().unwrap_or(0)
            })
            .collect()
    };
    let (a, b) = (parse(a), parse(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}
