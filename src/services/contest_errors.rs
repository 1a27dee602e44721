//! Contest API error classification
//!
//! Converts contest platform responses into structured errors so callers
//! can decide policy (skip, retry, log) instead of string-matching bodies.

use serde::Deserialize;
use thiserror::Error;

/// Structured contest API error
#[derive(Debug, Clone, Error)]
pub enum ContestError {
    /// Rate limited by the platform (HTTP 429)
    #[error("rate limited by contest API")]
    RateLimited,
    /// Platform temporarily unavailable (HTTP 503)
    #[error("contest API temporarily unavailable")]
    Unavailable,
    /// Bearer token rejected (HTTP 401/403)
    #[error("contest API authentication failed")]
    AuthFailed,
    /// Resource does not exist (HTTP 404)
    #[error("contest resource not found")]
    NotFound,
    /// Network/connection error (timeout, DNS, etc.)
    #[error("network error: {0}")]
    Network(String),
    /// Response body could not be decoded
    #[error("malformed contest response: {0}")]
    Malformed(String),
    /// Anything else, with status and body preserved for logging
    #[error("contest API error {status}: {body}")]
    Unknown { status: u16, body: String },
}

/// Error payload shape the platform uses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ContestError {
    /// Classify a non-2xx response
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            parsed.error.or(parsed.message).unwrap_or_default()
        } else {
            body.to_string()
        };

        match status {
            429 => ContestError::RateLimited,
            503 => ContestError::Unavailable,
            401 | 403 => ContestError::AuthFailed,
            404 => ContestError::NotFound,
            _ => ContestError::Unknown {
                status,
                body: message,
            },
        }
    }

    /// Classify a transport-level error
    pub fn from_network_error(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ContestError::Network("request timed out".to_string())
        } else if err.is_connect() {
            ContestError::Network("connection failed".to_string())
        } else {
            ContestError::Network(err.to_string())
        }
    }

    /// Whether the push-update workflow should retry this error.
    /// Only 429 and 503 qualify; everything else fails fast.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ContestError::RateLimited | ContestError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_is_retryable() {
        let err = ContestError::from_response(429, "");
        assert!(matches!(err, ContestError::RateLimited));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unavailable_is_retryable() {
        let err = ContestError::from_response(503, "maintenance");
        assert!(matches!(err, ContestError::Unavailable));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_auth_failed() {
        let err = ContestError::from_response(401, r#"{"error":"Unauthorized"}"#);
        assert!(matches!(err, ContestError::AuthFailed));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unknown_preserves_body() {
        let err = ContestError::from_response(500, r#"{"message":"boom"}"#);
        match err {
            ContestError::Unknown { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
