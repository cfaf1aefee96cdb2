//! License activation and deactivation against the store.
//!
//! Two transitions only:
//! - `Unlicensed --activate ok--> Licensed`
//! - `Licensed --deactivate (any remote outcome)--> Unlicensed`
//!
//! A failed activation leaves the stored record untouched.

use crate::client::http::BasicAuth;
use crate::client::verifier::RemoteVerifier;
use crate::config::StoreConfig;
use crate::license::record::{key_fingerprint, LicenseRecord, LicenseStatus};
use crate::protocol::models::{decode, ActivationResponse};
use crate::store::{load_option, save_option, OptionStore, LICENSE_OPTION};
use crate::ProError;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// What the store said when asked to deactivate.
#[derive(Debug, Clone)]
pub enum RemoteAck {
    /// Store confirmed the deactivation.
    Confirmed(Value),
    /// Store answered but did not confirm.
    Rejected(Value),
    /// Store could not be reached or answered garbage.
    Unreachable(String),
}

/// Result of a deactivation. The local record is always gone.
#[derive(Debug, Clone)]
pub struct Deactivation {
    /// Remote side of the exchange.
    pub remote: RemoteAck,
}

impl Deactivation {
    /// `true` when the store confirmed.
    pub fn confirmed(&self) -> bool {
        matches!(self.remote, RemoteAck::Confirmed(_))
    }
}

/// Client for the store's license endpoints.
#[derive(Clone)]
pub struct LicenseClient {
    config: StoreConfig,
    verifier: RemoteVerifier,
    store: Arc<dyn OptionStore>,
}

impl LicenseClient {
    /// Create a license client.
    pub fn new(config: &StoreConfig, verifier: RemoteVerifier, store: Arc<dyn OptionStore>) -> Self {
        Self {
            config: config.clone(),
            verifier,
            store,
        }
    }

    /// Activate `license_key` and persist the record on success.
    ///
    /// # Errors
    /// - `MissingLicenseKey` - Empty key (no request is made)
    /// - `NetworkError` - Store unreachable
    /// - `BadResponse` - Store answered with a non-JSON body
    /// - `InvalidProduct` - Key is valid but for another product
    /// - `ActivationFailed` - Store rejected the key
    pub fn activate(&self, license_key: &str) -> Result<ActivationResponse, ProError> {
        let key = license_key.trim();
        if key.is_empty() {
            return Err(ProError::MissingLicenseKey);
        }

        let fingerprint = key_fingerprint(key);
        let url = self.license_url("activate", key)?;
        tracing::debug!(license = %fingerprint, "activating license");

        let reply = self.verifier.get_json(&url, Some(self.auth()))?;
        tracing::debug!(license = %fingerprint, status = reply.status, "activation reply");

        if !reply.body.is_object() {
            return Err(ProError::ActivationFailed(
                "Activation failed (Unknown error).".to_string(),
            ));
        }
        let response: ActivationResponse = decode(reply.status, &reply.body)?;

        if reply.status != 200 || !response.success {
            let message = response.failure_message();
            tracing::info!(license = %fingerprint, %message, "activation rejected");
            return Err(ProError::ActivationFailed(message));
        }

        let product_id = response.product_id();
        if product_id != self.config.product_id {
            tracing::warn!(
                license = %fingerprint,
                product_id,
                expected = self.config.product_id,
                "license belongs to another product"
            );
            return Err(ProError::InvalidProduct { product_id });
        }

        let data = response.data.clone().unwrap_or_default();
        let record = LicenseRecord::activated(key, data.expires_at, data.token);
        save_option(self.store.as_ref(), LICENSE_OPTION, &record)?;

        tracing::info!(license = %fingerprint, "license activated");
        Ok(response)
    }

    /// Deactivate the stored license.
    ///
    /// The local record is removed whatever the store answers, including
    /// when it cannot be reached.
    ///
    /// # Errors
    /// - `NoLicense` - Nothing stored
    /// - `StorageIO` - The record could not be removed
    pub fn deactivate(&self) -> Result<Deactivation, ProError> {
        let record = self
            .record()?
            .filter(|r| !r.key.is_empty())
            .ok_or(ProError::NoLicense)?;

        let remote = self.notify_deactivation(&record.key);
        self.store.delete(LICENSE_OPTION)?;

        tracing::info!(
            license = %key_fingerprint(&record.key),
            confirmed = matches!(remote, RemoteAck::Confirmed(_)),
            "license deactivated locally"
        );
        Ok(Deactivation { remote })
    }

    fn notify_deactivation(&self, key: &str) -> RemoteAck {
        let reply = self
            .license_url("deactivate", key)
            .and_then(|url| self.verifier.get_json(&url, Some(self.auth())));

        match reply {
            Ok(reply) if RemoteVerifier::interpret(&reply).success => RemoteAck::Confirmed(reply.body),
            Ok(reply) => RemoteAck::Rejected(reply.body),
            Err(e) => {
                tracing::warn!(error = %e, "store did not acknowledge deactivation");
                RemoteAck::Unreachable(e.to_string())
            }
        }
    }

    /// Local status: `Valid` iff a record exists with status exactly `valid`.
    ///
    /// Expiry is not checked here.
    pub fn status(&self) -> LicenseStatus {
        match self.record() {
            Ok(Some(record)) => record.status(),
            Ok(None) => LicenseStatus::Invalid,
            Err(e) => {
                tracing::warn!(error = %e, "license record unreadable");
                LicenseStatus::Invalid
            }
        }
    }

    /// Stored license key, or an empty string.
    pub fn license_key(&self) -> String {
        self.record()
            .ok()
            .flatten()
            .map(|r| r.key)
            .unwrap_or_default()
    }

    /// Stored record, if it parses.
    pub fn record(&self) -> Result<Option<LicenseRecord>, ProError> {
        load_option(self.store.as_ref(), LICENSE_OPTION)
    }

    fn auth(&self) -> BasicAuth {
        BasicAuth::new(
            &self.config.credentials.consumer_key,
            &self.config.credentials.consumer_secret,
        )
    }

    /// `{store}/wp-json/lmfwc/v2/licenses/{action}/{key}` with the key as one
    /// percent-encoded path segment.
    fn license_url(&self, action: &str, key: &str) -> Result<String, ProError> {
        let mut url = Url::parse(self.config.store_base())
            .map_err(|e| ProError::ConfigError(format!("store_url is not a valid URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ProError::ConfigError("store_url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["wp-json", "lmfwc", "v2", "licenses", action, key]);
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::http::MockTransport;
    use crate::config::StoreCredentials;
    use crate::store::MemoryStore;
    use serde_json::json;

    struct Harness {
        mock: Arc<MockTransport>,
        store: Arc<MemoryStore>,
        client: LicenseClient,
    }

    fn harness() -> Harness {
        let config = StoreConfig::new(
            "https://store.example.com",
            StoreCredentials::new("ck_test", "cs_test"),
        );
        let mock = Arc::new(MockTransport::new());
        let store = Arc::new(MemoryStore::new());
        let client = LicenseClient::new(&config, RemoteVerifier::new(mock.clone()), store.clone());
        Harness { mock, store, client }
    }

    fn activation_body(product_id: i64) -> String {
        json!({
            "success": true,
            "data": {
                "productId": product_id,
                "expiresAt": "2026-06-30 23:59:59",
                "token": "tok_123"
            }
        })
        .to_string()
    }

    #[test]
    fn test_activate_persists_valid_record() {
        let h = harness();
        h.mock.push_response(200, &activation_body(61));

        let response = h.client.activate("  ABCD-1234  ").unwrap();
        assert!(response.success);

        let record = h.client.record().unwrap().unwrap();
        assert_eq!(record.key, "ABCD-1234");
        assert_eq!(record.status(), LicenseStatus::Valid);
        assert_eq!(record.expiry, "2026-06-30 23:59:59");
        assert_eq!(record.activation_token, "tok_123");
        assert_eq!(h.client.status(), LicenseStatus::Valid);

        let request = &h.mock.requests()[0];
        assert_eq!(
            request.url,
            "https://store.example.com/wp-json/lmfwc/v2/licenses/activate/ABCD-1234"
        );
        assert_eq!(
            request.basic_auth.as_ref().unwrap().header_value(),
            "Basic Y2tfdGVzdDpjc190ZXN0"
        );
    }

    #[test]
    fn test_activate_wrong_product_persists_nothing() {
        for product_id in [0, 1, 60, 62, 610] {
            let h = harness();
            h.mock.push_response(200, &activation_body(product_id));

            let result = h.client.activate("ABCD-1234");
            assert!(
                matches!(result, Err(ProError::InvalidProduct { product_id: p }) if p == product_id)
            );
            assert!(h.store.get(LICENSE_OPTION).unwrap().is_none());
            assert_eq!(h.client.status(), LicenseStatus::Invalid);
        }
    }

    #[test]
    fn test_activate_empty_key_makes_no_request() {
        let h = harness();
        assert!(matches!(h.client.activate("   "), Err(ProError::MissingLicenseKey)));
        assert_eq!(h.mock.call_count(), 0);
    }

    #[test]
    fn test_activate_store_rejection() {
        let h = harness();
        h.mock.push_response(
            404,
            r#"{"success":false,"message":"License key not found","error":"lmfwc_rest_data_error"}"#,
        );

        match h.client.activate("NOPE") {
            Err(ProError::ActivationFailed(msg)) => {
                assert_eq!(msg, "License key not found (lmfwc_rest_data_error)")
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(h.client.record().unwrap().is_none());
    }

    #[test]
    fn test_activate_success_flag_on_non_200_is_rejected() {
        let h = harness();
        h.mock.push_response(201, &activation_body(61));
        assert!(matches!(
            h.client.activate("ABCD"),
            Err(ProError::ActivationFailed(_))
        ));
        assert!(h.client.record().unwrap().is_none());
    }

    #[test]
    fn test_activate_html_body() {
        let h = harness();
        h.mock
            .push_response(500, "<html><body><p>There has been a critical error.</p></body></html>");

        match h.client.activate("ABCD") {
            Err(ProError::BadResponse { status, snippet }) => {
                assert_eq!(status, 500);
                assert_eq!(snippet, "There has been a critical error.");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_activate_network_error_leaves_existing_record() {
        let h = harness();
        h.mock.push_response(200, &activation_body(61));
        h.client.activate("FIRST").unwrap();

        h.mock.push_network_error("connection refused");
        assert!(matches!(
            h.client.activate("SECOND"),
            Err(ProError::NetworkError(_))
        ));
        assert_eq!(h.client.license_key(), "FIRST");
    }

    #[test]
    fn test_key_is_percent_encoded() {
        let h = harness();
        h.mock.push_response(200, &activation_body(61));
        h.client.activate("a/b c").unwrap();
        assert_eq!(
            h.mock.requests()[0].url,
            "https://store.example.com/wp-json/lmfwc/v2/licenses/activate/a%2Fb%20c"
        );
    }

    #[test]
    fn test_deactivate_without_record() {
        let h = harness();
        assert!(matches!(h.client.deactivate(), Err(ProError::NoLicense)));
        assert_eq!(h.mock.call_count(), 0);
    }

    #[test]
    fn test_deactivate_clears_on_confirmation() {
        let h = harness();
        h.mock.push_response(200, &activation_body(61));
        h.client.activate("ABCD").unwrap();

        h.mock.push_response(200, r#"{"success":true,"data":{}}"#);
        let outcome = h.client.deactivate().unwrap();
        assert!(outcome.confirmed());
        assert!(h.client.record().unwrap().is_none());
        assert!(h.mock.requests()[1].url.ends_with("/licenses/deactivate/ABCD"));
    }

    #[test]
    fn test_deactivate_clears_when_store_unreachable() {
        let h = harness();
        h.mock.push_response(200, &activation_body(61));
        h.client.activate("ABCD").unwrap();

        h.mock.push_network_error("operation timed out");
        let outcome = h.client.deactivate().unwrap();
        assert!(matches!(outcome.remote, RemoteAck::Unreachable(_)));
        assert_eq!(h.client.status(), LicenseStatus::Invalid);

        // second call has nothing left to deactivate
        assert!(matches!(h.client.deactivate(), Err(ProError::NoLicense)));
        assert_eq!(h.mock.call_count(), 2);
    }

    #[test]
    fn test_deactivate_clears_when_store_rejects() {
        let h = harness();
        h.store
            .set(LICENSE_OPTION, &json!({"key": "ABCD", "status": "valid"}))
            .unwrap();

        h.mock.push_response(404, r#"{"success":false,"message":"not found"}"#);
        let outcome = h.client.deactivate().unwrap();
        assert!(matches!(outcome.remote, RemoteAck::Rejected(_)));
        assert!(h.store.get(LICENSE_OPTION).unwrap().is_none());
    }

    #[test]
    fn test_status_invalid_cases() {
        let h = harness();
        assert_eq!(h.client.status(), LicenseStatus::Invalid);

        h.store
            .set(LICENSE_OPTION, &json!({"key": "ABCD", "status": "expired"}))
            .unwrap();
        assert_eq!(h.client.status(), LicenseStatus::Invalid);

        h.store.set(LICENSE_OPTION, &json!({"key": "ABCD"})).unwrap();
        assert_eq!(h.client.status(), LicenseStatus::Invalid);

        h.store.set(LICENSE_OPTION, &json!("garbage")).unwrap();
        assert_eq!(h.client.status(), LicenseStatus::Invalid);
        assert_eq!(h.client.license_key(), "");
    }

    #[test]
    fn test_status_ignores_past_expiry() {
        let h = harness();
        h.store
            .set(
                LICENSE_OPTION,
                &json!({"key": "ABCD", "status": "valid", "expiry": "2001-01-01 00:00:00"}),
            )
            .unwrap();
        assert_eq!(h.client.status(), LicenseStatus::Valid);
    }
}
