//! Integration tests for the backend connection
//!
//! These tests verify that the configured backend is reachable and answers
//! requests made through the shared client handle. They need a project
//! configured through the `APPWRITE_*` environment variables.

use common::{BackendClient, BackendConfig, ServiceError};
use reqwest::Method;
use serde_json::Value;

/// Test that verifies the endpoint answers an anonymous account lookup
#[tokio::test]
#[ignore = "requires a backend configured through APPWRITE_* variables"]
async fn test_backend_integration() -> Result<(), Box<dyn std::error::Error>> {
    let config = BackendConfig::from_env()?;
    let client = BackendClient::new(config)?;

    // No session yet, so the service must refuse with 401
    let request = client.request(Method::GET, client.url("account")?).await;
    let result = client.send::<Value>(request).await;

    match result {
        Err(ServiceError::Api { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected an unauthorized response, got {:?}", other),
    }
    assert!(client.session_cookie().await.is_none());

    Ok(())
}
