//! Common library for the Aora backend client
//!
//! This crate provides what the account, database and storage clients share:
//! configuration, the connection handle holding the current session, the
//! transport error type, the record models and id generation.

pub mod client;
pub mod config;
pub mod error;
pub mod id;
pub mod models;

pub use crate::client::BackendClient;
pub use crate::config::BackendConfig;
pub use crate::error::{ServiceError, ServiceResult};

/// Example usage of the backend client
///
/// ```rust,no_run
/// use common::{BackendClient, BackendConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = BackendConfig::from_env()?;
///     let client = BackendClient::new(config)?;
///     println!("Signed in: {}", client.session_cookie().await.is_some());
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
