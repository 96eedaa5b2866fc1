//! Error taxonomy for the data-access layer.
//!
//! Every expected failure mode comes back through [`ApiError`]; nothing in
//! the public API panics for a failed request. Unexpected programming
//! errors are left to propagate.

use campusmarket_core::CoreError;

/// Uniform failure classification for every request the layer performs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable response reached us: connect failure, timeout, or the
    /// body could not be read off the wire.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with an error. Carries the HTTP status and the
    /// server-supplied message when one could be parsed from the body.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body could not be decoded into the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A client-side precondition failed before any request was sent.
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Convenience alias for the layer's return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    /// Errors surfacing from `reqwest` itself (as opposed to status or
    /// body interpretation, which the transport classifies explicitly)
    /// mean the request never produced a usable response.
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ApiError::Validation(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_includes_status_and_message() {
        let err = ApiError::Http {
            status: 404,
            message: "Room not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: Room not found");
    }

    #[test]
    fn core_validation_maps_to_validation() {
        let err: ApiError = CoreError::Validation("Missing required field 'rent'".into()).into();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn reqwest_error_maps_to_network() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err: ApiError = req_err.into();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
