//! Blocking HTTP transport.
//!
//! Every outbound call in the crate goes through [`HttpTransport`], so the
//! store and siteverify clients can be exercised without a network.

use crate::config::{StoreConfig, TlsPolicy};
use crate::ProError;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use std::fmt;

/// HTTP method used by the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST with a form-encoded body
    Post,
}

/// Basic-auth credential pair.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    user: String,
    password: String,
}

impl BasicAuth {
    /// Build a credential pair.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// `Authorization` header value: `Basic base64(user:password)`.
    pub fn header_value(&self) -> String {
        let raw = format!("{}:{}", self.user, self.password);
        format!("Basic {}", STANDARD.encode(raw.as_bytes()))
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outbound request description.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URL including any query string.
    pub url: String,
    /// Optional Basic auth credentials.
    pub basic_auth: Option<BasicAuth>,
    /// Form fields for POST requests.
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    /// GET `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            basic_auth: None,
            form: Vec::new(),
        }
    }

    /// POST `form` to `url`.
    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            basic_auth: None,
            form,
        }
    }

    /// Attach Basic auth credentials.
    pub fn with_basic_auth(mut self, auth: BasicAuth) -> Self {
        self.basic_auth = Some(auth);
        self
    }

    /// Look up a form field.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Get the body as a UTF-8 string.
    pub fn body_str(&self) -> Result<&str, ProError> {
        std::str::from_utf8(&self.body).map_err(|_| ProError::BadResponse {
            status: self.status,
            snippet: "invalid UTF-8 in body".to_string(),
        })
    }
}

/// Performs one blocking HTTP exchange.
pub trait HttpTransport: Send + Sync {
    /// Execute `request`. Transport failures map to [`ProError::NetworkError`].
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ProError>;
}

/// Reqwest-backed transport.
pub struct ReqwestTransport {
    client: Client,
    user_agent: String,
}

impl ReqwestTransport {
    /// Build a transport from store config (timeout, TLS policy, User-Agent).
    pub fn new(config: &StoreConfig) -> Result<Self, ProError> {
        let builder = Client::builder().timeout(config.timeout);
        let builder = apply_tls_policy(builder, config.tls);
        let client = builder
            .build()
            .map_err(|e| ProError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            user_agent: build_user_agent(config),
        })
    }
}

fn apply_tls_policy(
    builder: reqwest::blocking::ClientBuilder,
    policy: TlsPolicy,
) -> reqwest::blocking::ClientBuilder {
    match policy {
        TlsPolicy::Verified => builder,
        #[cfg(feature = "insecure-tls")]
        TlsPolicy::AcceptInvalidCerts => {
            tracing::warn!("TLS certificate verification is disabled for store requests");
            builder.danger_accept_invalid_certs(true)
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ProError> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url).form(&request.form),
        };

        let mut builder = builder
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json");

        if let Some(auth) = &request.basic_auth {
            builder = builder
                .header(AUTHORIZATION, auth.header_value())
                .header(CONTENT_TYPE, "application/json");
        }

        let response = builder
            .send()
            .map_err(|e| ProError::NetworkError(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| ProError::NetworkError(format!("Failed to read body: {}", e)))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// Build a User-Agent string from config.
///
/// Format: `<product>/loginforge-<version> <app>`
pub fn build_user_agent(config: &StoreConfig) -> String {
    format!(
        "{}/loginforge-{} {}",
        config.user_agent_product,
        env!("CARGO_PKG_VERSION"),
        config.app_name
    )
}

/// Scripted transport that records requests.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Default)]
pub struct MockTransport {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<HttpResponse, ProError>>>,
    requests: std::sync::Mutex<Vec<HttpRequest>>,
}

#[cfg(any(test, feature = "test-seams"))]
impl MockTransport {
    /// Empty transport; calls fail with a network error until responses are queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn push_response(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .expect("mock lock")
            .push_back(Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            }));
    }

    /// Queue a transport failure.
    pub fn push_network_error(&self, message: &str) {
        self.responses
            .lock()
            .expect("mock lock")
            .push_back(Err(ProError::NetworkError(message.to_string())));
    }

    /// Number of requests executed so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("mock lock").len()
    }

    /// Requests executed so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("mock lock").clone()
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl HttpTransport for MockTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ProError> {
        self.requests
            .lock()
            .expect("mock lock")
            .push(request.clone());
        self.responses
            .lock()
            .expect("mock lock")
            .pop_front()
            .unwrap_or_else(|| Err(ProError::NetworkError("no response queued".to_string())))
    }
}
