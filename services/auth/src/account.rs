//! Account identity and session management

use async_trait::async_trait;
use common::{
    BackendClient, ServiceResult,
    models::{Identity, Session},
};
use reqwest::Method;
use serde::Serialize;
use tracing::info;

/// Identity and session operations of the hosted backend
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Create a new account identity under `id`
    async fn create_identity(
        &self,
        id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> ServiceResult<Identity>;

    /// Open a session for the account matching the credentials
    async fn create_email_session(&self, email: &str, password: &str) -> ServiceResult<Session>;

    /// Identity owning the current session
    async fn get_identity(&self) -> ServiceResult<Identity>;

    /// Close the current session
    async fn delete_current_session(&self) -> ServiceResult<()>;
}

/// Account client over the REST API
#[derive(Clone)]
pub struct AccountClient {
    client: BackendClient,
}

impl AccountClient {
    /// Create a new account client
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityApi for AccountClient {
    async fn create_identity(
        &self,
        id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> ServiceResult<Identity> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct CreateAccountRequest<'a> {
            user_id: &'a str,
            email: &'a str,
            password: &'a str,
            name: &'a str,
        }

        info!("Creating account identity for: {}", email);

        let request = self
            .client
            .request(Method::POST, self.client.url("account")?)
            .await
            .json(&CreateAccountRequest {
                user_id: id,
                email,
                password,
                name,
            });

        self.client.send(request).await
    }

    async fn create_email_session(&self, email: &str, password: &str) -> ServiceResult<Session> {
        #[derive(Serialize)]
        struct CreateSessionRequest<'a> {
            email: &'a str,
            password: &'a str,
        }

        info!("Creating email session for: {}", email);

        let request = self
            .client
            .request(Method::POST, self.client.url("account/sessions/email")?)
            .await
            .json(&CreateSessionRequest { email, password });

        self.client.send(request).await
    }

    async fn get_identity(&self) -> ServiceResult<Identity> {
        let request = self
            .client
            .request(Method::GET, self.client.url("account")?)
            .await;

        self.client.send(request).await
    }

    async fn delete_current_session(&self) -> ServiceResult<()> {
        info!("Deleting current session");

        let request = self
            .client
            .request(Method::DELETE, self.client.url("account/sessions/current")?)
            .await;

        self.client.send_empty(request).await?;
        self.client.clear_session().await;

        Ok(())
    }
}
