//! Backend configuration
//!
//! Every coordinate the client needs to reach the hosted backend: the API
//! endpoint, the project and platform identifiers, and the ids of the
//! database, collections and storage bucket the app works with.

use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::{ServiceError, ServiceResult};

/// Default hosted API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";

/// Default application/platform identifier
pub const DEFAULT_PLATFORM: &str = "com.aora.app";

/// Default transport timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Configuration for the backend connection
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BackendConfig {
    /// API endpoint (e.g., "https://cloud.appwrite.io/v1")
    pub endpoint: String,
    /// Application or bundle identifier registered as a platform
    pub platform: String,
    /// Project id
    pub project_id: String,
    /// Database holding the users and videos collections
    pub database_id: String,
    /// Collection of user documents
    pub user_collection_id: String,
    /// Collection of video posts
    pub video_collection_id: String,
    /// Storage bucket for thumbnails and videos
    pub storage_id: String,
    /// Transport timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

impl BackendConfig {
    /// Create a new BackendConfig from environment variables
    ///
    /// # Environment Variables
    /// - `APPWRITE_ENDPOINT`: API endpoint (default: "https://cloud.appwrite.io/v1")
    /// - `APPWRITE_PLATFORM`: platform identifier (default: "com.aora.app")
    /// - `APPWRITE_PROJECT_ID`: project id (required)
    /// - `APPWRITE_DATABASE_ID`: database id (required)
    /// - `APPWRITE_USER_COLLECTION_ID`: users collection id (required)
    /// - `APPWRITE_VIDEO_COLLECTION_ID`: videos collection id (required)
    /// - `APPWRITE_STORAGE_ID`: storage bucket id (required)
    /// - `APPWRITE_REQUEST_TIMEOUT`: transport timeout in seconds (default: 30)
    pub fn from_env() -> ServiceResult<Self> {
        let settings = Config::builder()
            .set_default("endpoint", DEFAULT_ENDPOINT)?
            .set_default("platform", DEFAULT_PLATFORM)?
            .add_source(Environment::with_prefix("APPWRITE"))
            .build()?;

        let config: BackendConfig = settings.try_deserialize()?;
        config.endpoint_url()?;

        Ok(config)
    }

    /// Parsed endpoint with a trailing slash, ready for `Url::join`
    pub fn endpoint_url(&self) -> ServiceResult<Url> {
        let mut endpoint = self.endpoint.trim_end_matches('/').to_string();
        endpoint.push('/');

        Url::parse(&endpoint)
            .map_err(|e| ServiceError::InvalidUrl(format!("{}: {}", self.endpoint, e)))
    }

    /// Transport timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Origin header value announcing the registered platform
    pub fn origin(&self) -> String {
        format!("appwrite-{}://{}", std::env::consts::OS, self.platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const REQUIRED: [(&str, &str); 5] = [
        ("APPWRITE_PROJECT_ID", "project"),
        ("APPWRITE_DATABASE_ID", "database"),
        ("APPWRITE_USER_COLLECTION_ID", "users"),
        ("APPWRITE_VIDEO_COLLECTION_ID", "videos"),
        ("APPWRITE_STORAGE_ID", "files"),
    ];

    fn set_required() {
        for (key, value) in REQUIRED {
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }

    fn clear_all() {
        for (key, _) in REQUIRED {
            unsafe {
                std::env::remove_var(key);
            }
        }
        unsafe {
            std::env::remove_var("APPWRITE_ENDPOINT");
            std::env::remove_var("APPWRITE_PLATFORM");
            std::env::remove_var("APPWRITE_REQUEST_TIMEOUT");
        }
    }

    #[test]
    #[serial]
    fn test_backend_config_from_env() {
        clear_all();
        set_required();

        let config = BackendConfig::from_env().unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.platform, DEFAULT_PLATFORM);
        assert_eq!(config.project_id, "project");
        assert_eq!(config.database_id, "database");
        assert_eq!(config.user_collection_id, "users");
        assert_eq!(config.video_collection_id, "videos");
        assert_eq!(config.storage_id, "files");
        assert_eq!(config.request_timeout, 30);

        clear_all();
    }

    #[test]
    #[serial]
    fn test_backend_config_from_env_with_custom_values() {
        clear_all();
        set_required();
        unsafe {
            std::env::set_var("APPWRITE_ENDPOINT", "http://localhost/v1");
            std::env::set_var("APPWRITE_PLATFORM", "com.example.videos");
            std::env::set_var("APPWRITE_REQUEST_TIMEOUT", "5");
        }

        let config = BackendConfig::from_env().unwrap();
        assert_eq!(config.endpoint, "http://localhost/v1");
        assert_eq!(config.platform, "com.example.videos");
        assert_eq!(config.timeout(), Duration::from_secs(5));

        clear_all();
    }

    #[test]
    #[serial]
    fn test_backend_config_requires_project() {
        clear_all();

        assert!(BackendConfig::from_env().is_err());
    }

    #[test]
    fn test_endpoint_url_gets_trailing_slash() {
        let config = BackendConfig {
            endpoint: "https://cloud.appwrite.io/v1".to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            project_id: "p".to_string(),
            database_id: "d".to_string(),
            user_collection_id: "u".to_string(),
            video_collection_id: "v".to_string(),
            storage_id: "s".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };

        let url = config.endpoint_url().unwrap().join("account").unwrap();
        assert_eq!(url.as_str(), "https://cloud.appwrite.io/v1/account");
    }
}
