//! One network call, one uniform result.
//!
//! [`Transport::send`] executes a single HTTP request against the backend
//! and classifies the outcome into the [`ApiError`] taxonomy. The backend
//! wraps every body in the `{success, data?, error?, message?}` envelope;
//! the transport unwraps it here so callers only ever see the `data`
//! payload or a typed error.
//!
//! No retries happen at this layer. Retrying, if wanted at all, is the
//! caller's decision (in practice: the user pressing "Try again").

use serde::Deserialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::multipart::UploadPayload;

pub use reqwest::Method;

/// Body variants a request can carry.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(UploadPayload),
}

/// Per-request options for [`Transport::send`].
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// Query-string parameters.
    pub params: Vec<(String, String)>,
    pub body: RequestBody,
    /// Bearer token; attached as an `Authorization` header when present.
    pub auth_token: Option<String>,
}

/// Stateless executor for backend HTTP requests.
///
/// Holds only the pooled `reqwest` client and the base URL; every call is
/// independent and every call is a suspension point.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
}

impl Transport {
    /// Build a transport with the configured base URL and request timeout.
    pub fn new(config: &ClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute one request and return the envelope's `data` payload.
    ///
    /// `method` is one of GET/POST/PUT/PATCH/DELETE. A missing `data`
    /// field (e.g. a delete acknowledgement) comes back as `None`.
    ///
    /// Failure classification:
    /// - request never produced a response (connect, DNS, timeout, body
    ///   read) -> [`ApiError::Network`];
    /// - non-2xx status, or an envelope reporting `success: false` ->
    ///   [`ApiError::Http`] with the server message when available;
    /// - undecodable body -> [`ApiError::Decode`].
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>, ApiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(method = %method, %url, "Sending request");

        let mut request = self.http.request(method, &url);
        if !options.params.is_empty() {
            request = request.query(&options.params);
        }
        if let Some(token) = &options.auth_token {
            request = request.bearer_auth(token);
        }
        request = match options.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(payload) => request.multipart(payload.into_form()?),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {e}")))?;

        interpret(status, &body)
    }
}

/// Response envelope the backend wraps every body in.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl Envelope {
    fn message_text(self, status: reqwest::StatusCode) -> String {
        self.error
            .or(self.message)
            .unwrap_or_else(|| default_message(status))
    }
}

fn default_message(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

/// Classify a completed HTTP exchange into the result taxonomy.
fn interpret(status: reqwest::StatusCode, body: &str) -> Result<Option<Value>, ApiError> {
    if status.is_success() {
        // Delete acknowledgements may come back with no body at all.
        if body.trim().is_empty() {
            return Ok(None);
        }
        let envelope: Envelope = serde_json::from_str(body)
            .map_err(|e| ApiError::Decode(format!("Unexpected response body: {e}")))?;
        if envelope.success {
            Ok(envelope.data)
        } else {
            // The server answered 2xx but explicitly reported failure.
            Err(ApiError::Http {
                status: status.as_u16(),
                message: envelope.message_text(status),
            })
        }
    } else {
        let message = serde_json::from_str::<Envelope>(body)
            .ok()
            .map(|envelope| envelope.message_text(status))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    default_message(status)
                } else {
                    body.to_string()
                }
            });
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
