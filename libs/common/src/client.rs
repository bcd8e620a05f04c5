//! Shared connection to the hosted backend
//!
//! `BackendClient` is the explicit handle every API client is built from. It
//! owns the HTTP client, the configuration and the session credential of the
//! signed-in user, so two handles never share a session by accident.

use reqwest::{
    Client, Method, RequestBuilder, Response,
    header::{HeaderMap, HeaderValue, ORIGIN},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use url::Url;

use crate::{
    config::BackendConfig,
    error::{ServiceError, ServiceResult},
};

/// Header carrying the session cookie for clients without a cookie jar
pub const FALLBACK_COOKIES_HEADER: &str = "x-fallback-cookies";

/// Response format version the models are written against
pub const RESPONSE_FORMAT: &str = "1.6.0";

/// Connection handle shared by the account, database and storage clients
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    config: Arc<BackendConfig>,
    endpoint: Url,
    session: Arc<RwLock<Option<String>>>,
}

impl BackendClient {
    /// Initialize a new backend client
    pub fn new(config: BackendConfig) -> ServiceResult<Self> {
        let endpoint = config.endpoint_url()?;

        let mut headers = HeaderMap::new();
        headers.insert("x-appwrite-project", header_value(&config.project_id)?);
        headers.insert(
            "x-appwrite-response-format",
            HeaderValue::from_static(RESPONSE_FORMAT),
        );
        headers.insert(ORIGIN, header_value(&config.origin())?);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        info!("Backend client initialized with endpoint: {}", endpoint);

        Ok(Self {
            http,
            config: Arc::new(config),
            endpoint,
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Backend configuration
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Resolve a path relative to the endpoint
    pub fn url(&self, path: &str) -> ServiceResult<Url> {
        Ok(self.endpoint.join(path.trim_start_matches('/'))?)
    }

    /// Resolve a path and make it retrievable without headers by adding the
    /// `project` query parameter
    pub fn public_url(&self, path: &str, query: &[(&str, String)]) -> ServiceResult<Url> {
        let mut url = self.url(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("project", &self.config.project_id);
        }
        Ok(url)
    }

    /// Start a request carrying the current session, if any
    pub async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url.path());

        let builder = self.http.request(method, url);
        match self.session.read().await.as_deref() {
            Some(cookie) => builder.header(FALLBACK_COOKIES_HEADER, cookie),
            None => builder,
        }
    }

    /// Send a request and decode a JSON body
    pub async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ServiceResult<T> {
        let response = self.execute(builder).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to decode response: {}", e);
            ServiceError::InvalidResponse(e.to_string())
        })
    }

    /// Send a request whose success carries no body
    pub async fn send_empty(&self, builder: RequestBuilder) -> ServiceResult<()> {
        self.execute(builder).await?;
        Ok(())
    }

    async fn execute(&self, builder: RequestBuilder) -> ServiceResult<Response> {
        let response = builder.send().await?;
        self.remember_session(&response).await;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ServiceError::from_response_body(status.as_u16(), &body);
            error!("Request failed with status {}: {}", status.as_u16(), err);
            return Err(err);
        }

        Ok(response)
    }

    async fn remember_session(&self, response: &Response) {
        let cookie = response
            .headers()
            .get(FALLBACK_COOKIES_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty() && *value != "[]");

        if let Some(cookie) = cookie {
            *self.session.write().await = Some(cookie.to_string());
        }
    }

    /// Current session credential
    pub async fn session_cookie(&self) -> Option<String> {
        self.session.read().await.clone()
    }

    /// Restore a session credential saved by an earlier process
    pub async fn set_session_cookie(&self, cookie: Option<String>) {
        *self.session.write().await = cookie;
    }

    /// Forget the current session
    pub async fn clear_session(&self) {
        *self.session.write().await = None;
    }
}

fn header_value(value: &str) -> ServiceResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        ServiceError::Configuration(config::ConfigError::Message(format!(
            "Invalid header value {}: {}",
            value, e
        )))
    })
}
