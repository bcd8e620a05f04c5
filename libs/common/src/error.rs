//! Custom error types for the common library
//!
//! This module defines the transport-level error type returned by every
//! call made against the hosted backend.

use serde::Deserialize;
use thiserror::Error;

/// Custom error type for remote service operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("{message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    /// The service answered but the payload could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A URL could not be built from the configured endpoint
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Local I/O failure (reading an upload, the session file, ...)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

impl ServiceError {
    /// HTTP status of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Api { status, .. } => Some(*status),
            ServiceError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Build an API error from a failed response body.
    ///
    /// The service reports failures as `{"message", "code", "type"}`; bodies
    /// that do not match are kept verbatim as the message.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: String,
            #[serde(rename = "type", default)]
            kind: String,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ServiceError::Api {
                status,
                kind: parsed.kind,
                message: parsed.message,
            },
            Err(_) => ServiceError::Api {
                status,
                kind: String::new(),
                message: if body.is_empty() {
                    format!("Request failed with status {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }

    /// Shorthand for an unauthorized API error
    pub fn unauthorized(kind: &str, message: &str) -> Self {
        ServiceError::Api {
            status: 401,
            kind: kind.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for ServiceError {
    fn from(err: url::ParseError) -> Self {
        ServiceError::InvalidUrl(err.to_string())
    }
}

/// Type alias for Result with ServiceError
pub type ServiceResult<T> = Result<T, ServiceError>;
