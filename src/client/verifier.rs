//! Shared request/response handling for store and siteverify calls.
//!
//! Every remote check has the same shape: send one request, decode a JSON
//! body, and reduce it to a verdict plus a message.

use crate::client::http::{BasicAuth, HttpRequest, HttpTransport};
use crate::errors::ErrorKind;
use crate::settings::sanitize::strip_all_tags;
use crate::ProError;
use serde_json::Value;
use std::sync::Arc;

/// Longest body excerpt carried in a `bad_response` error.
pub const SNIPPET_LIMIT: usize = 150;

/// Decoded JSON reply.
#[derive(Debug, Clone)]
pub struct JsonReply {
    /// HTTP status code.
    pub status: u16,
    /// Parsed body.
    pub body: Value,
}

impl JsonReply {
    /// `true` when the body carries `"success": true`.
    pub fn success_flag(&self) -> bool {
        self.body.get("success").and_then(Value::as_bool) == Some(true)
    }

    /// String field at the top level of the body.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.body.get(name).and_then(Value::as_str)
    }
}

/// Outcome of a single remote verification, handed straight to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Whether the check passed.
    pub success: bool,
    /// Failure classification (None on success).
    pub error_kind: Option<ErrorKind>,
    /// Human-readable message.
    pub message: String,
}

impl VerificationResult {
    /// Successful result.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            error_kind: None,
            message: message.into(),
        }
    }

    /// Failed result.
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_kind: Some(kind),
            message: message.into(),
        }
    }

    /// Failed result from an error.
    pub fn from_error(error: &ProError) -> Self {
        Self::failure(error.kind(), error.to_string())
    }

    /// Collapse an operation outcome into a result.
    pub fn from_outcome(outcome: Result<String, ProError>) -> Self {
        match outcome {
            Ok(message) => Self::ok(message),
            Err(e) => Self::from_error(&e),
        }
    }

    /// `true` if this result records a failure.
    pub fn is_failure(&self) -> bool {
        !self.success
    }

    /// Wire code of the failure, if any.
    pub fn error_code(&self) -> Option<String> {
        self.error_kind.map(|k| k.code().into_owned())
    }
}

/// Sends requests and decodes JSON replies.
#[derive(Clone)]
pub struct RemoteVerifier {
    transport: Arc<dyn HttpTransport>,
}

impl RemoteVerifier {
    /// Wrap a transport.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// GET `url`, optionally with Basic auth, and decode the JSON body.
    pub fn get_json(&self, url: &str, auth: Option<BasicAuth>) -> Result<JsonReply, ProError> {
        let mut request = HttpRequest::get(url);
        if let Some(auth) = auth {
            request = request.with_basic_auth(auth);
        }
        self.send(&request)
    }

    /// POST a form to `url` and decode the JSON body.
    pub fn post_form(&self, url: &str, form: Vec<(String, String)>) -> Result<JsonReply, ProError> {
        self.send(&HttpRequest::post_form(url, form))
    }

    /// Execute `request` and decode the JSON body.
    pub fn send(&self, request: &HttpRequest) -> Result<JsonReply, ProError> {
        let response = self.transport.execute(request)?;
        let status = response.status;
        let text = response.body_str()?;

        tracing::debug!(status, bytes = text.len(), "remote reply received");

        let body = serde_json::from_str::<Value>(text).map_err(|_| ProError::BadResponse {
            status,
            snippet: body_snippet(text),
        })?;

        Ok(JsonReply { status, body })
    }

    /// Reduce a `success`/`message`/`error` style body to a verdict.
    pub fn interpret(reply: &JsonReply) -> VerificationResult {
        let message = reply
            .str_field("message")
            .or_else(|| reply.str_field("error"))
            .map(str::to_string);

        if reply.success_flag() {
            VerificationResult::ok(message.unwrap_or_else(|| "OK".to_string()))
        } else {
            VerificationResult::failure(
                ErrorKind::RemoteRejected,
                message.unwrap_or_else(|| format!("Remote check failed (HTTP {}).", reply.status)),
            )
        }
    }
}

/// Tag-stripped, whitespace-collapsed excerpt of a body, at most
/// [`SNIPPET_LIMIT`] characters.
pub fn body_snippet(body: &str) -> String {
    let text = strip_all_tags(body);
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(SNIPPET_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::http::{Method, MockTransport};

    fn verifier() -> (Arc<MockTransport>, RemoteVerifier) {
        let mock = Arc::new(MockTransport::new());
        let verifier = RemoteVerifier::new(mock.clone());
        (mock, verifier)
    }

    #[test]
    fn test_get_json_success() {
        let (mock, verifier) = verifier();
        mock.push_response(200, r#"{"success":true,"message":"done"}"#);

        let reply = verifier
            .get_json("https://store.test/x", Some(BasicAuth::new("a", "b")))
            .unwrap();
        assert!(reply.success_flag());

        let requests = mock.requests();
        assert_eq!(requests[0].method, Method::Get);
        assert!(requests[0].basic_auth.is_some());
    }

    #[test]
    fn test_transport_failure_is_network_error() {
        let (mock, verifier) = verifier();
        mock.push_network_error("operation timed out");

        let err = verifier.get_json("https://store.test/x", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[test]
    fn test_html_body_is_bad_response_with_snippet() {
        let (mock, verifier) = verifier();
        mock.push_response(
            500,
            "<html><head><style>body{color:red}</style></head><body><h1>Fatal error</h1><p>Allowed memory exhausted</p></body></html>",
        );

        match verifier.get_json("https://store.test/x", None) {
            Err(ProError::BadResponse { status, snippet }) => {
                assert_eq!(status, 500);
                assert!(snippet.contains("Fatal error"));
                assert!(!snippet.contains('<'));
                assert!(!snippet.contains("color:red"));
            }
            other => panic!("expected BadResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_snippet_is_plain_text() {
        assert_eq!(body_snippet("Error: A & B <b>x</b>"), "Error: A & B x");
        assert_eq!(
            body_snippet("<p>Fatal</p>\n<script>var a = 1 < 2;</script>  <p>error</p>"),
            "Fatal error"
        );
    }

    #[test]
    fn test_snippet_truncated_to_limit() {
        let body = "x".repeat(400);
        assert_eq!(body_snippet(&body).chars().count(), SNIPPET_LIMIT);
    }

    #[test]
    fn test_interpret_failure_uses_message() {
        let reply = JsonReply {
            status: 404,
            body: serde_json::json!({"success": false, "message": "License key not found"}),
        };
        let result = RemoteVerifier::interpret(&reply);
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::RemoteRejected));
        assert_eq!(result.message, "License key not found");
    }

    #[test]
    fn test_interpret_without_fields() {
        let reply = JsonReply {
            status: 503,
            body: serde_json::json!({}),
        };
        let result = RemoteVerifier::interpret(&reply);
        assert!(result.is_failure());
        assert_eq!(result.message, "Remote check failed (HTTP 503).");
    }

    #[test]
    fn test_result_from_outcome() {
        let ok = VerificationResult::from_outcome(Ok("activated".into()));
        assert!(ok.success);
        assert_eq!(ok.error_code(), None);

        let err = VerificationResult::from_outcome(Err(ProError::NoLicense));
        assert_eq!(err.error_code().as_deref(), Some("no_license"));
        assert_eq!(err.message, "No active license found.");
    }
}
