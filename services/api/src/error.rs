//! Custom error types for the backend facade

use common::models::InvalidAssetKind;
use std::fmt::Display;
use thiserror::Error;
use tracing::error;

/// Failure of a facade operation.
///
/// Every variant carries the message of the underlying failure; transient
/// and permanent failures are not told apart.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Session or credential failure
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A step of the sign-up pipeline failed
    #[error("Registration error: {0}")]
    Registration(String),

    /// Document read or write failure
    #[error("Query error: {0}")]
    Query(String),

    /// Asset transfer failure
    #[error("Upload error: {0}")]
    Upload(String),

    /// Asset kind other than image or video
    #[error("Invalid asset kind: {0}")]
    InvalidAssetKind(String),
}

impl From<InvalidAssetKind> for ApiError {
    fn from(err: InvalidAssetKind) -> Self {
        ApiError::InvalidAssetKind(err.0)
    }
}

/// Log `context` with the failure and wrap its message in `variant`
pub(crate) fn report<E: Display>(
    context: &'static str,
    variant: fn(String) -> ApiError,
) -> impl FnOnce(E) -> ApiError {
    move |e| {
        error!("{}: {}", context, e);
        variant(e.to_string())
    }
}

/// Type alias for facade results
pub type ApiResult<T> = Result<T, ApiError>;
