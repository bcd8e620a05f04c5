//! Backend facade used by the app screens
//!
//! Each operation turns one user intent into the account, database and
//! storage calls behind it and reports failures through [`ApiError`].

use auth::{AccountClient, Avatars, IdentityApi, validation::validate_registration};
use common::{
    BackendClient, BackendConfig, ServiceResult, id,
    models::{AssetKind, DocumentList, NewPost, NewUserAccount, Post, Session, UserAccount},
};
use media::{FileHandle, PreviewOptions, StorageApi, StorageClient};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::{
    documents::{CREATED_AT, DatabaseClient, DocumentApi, Query},
    error::{ApiError, ApiResult, report},
};

/// Number of posts shown in the "latest videos" strip
pub const DEFAULT_LATEST_POSTS: u32 = 5;

/// Form submitted when publishing a video
#[derive(Debug, Clone)]
pub struct PostForm {
    pub title: String,
    pub prompt: String,
    pub thumbnail: FileHandle,
    pub video: FileHandle,
    pub user_id: String,
}

/// Where the app's records live on the backend
#[derive(Debug, Clone)]
struct Collections {
    database: String,
    users: String,
    videos: String,
    bucket: String,
}

impl From<&BackendConfig> for Collections {
    fn from(config: &BackendConfig) -> Self {
        Self {
            database: config.database_id.clone(),
            users: config.user_collection_id.clone(),
            videos: config.video_collection_id.clone(),
            bucket: config.storage_id.clone(),
        }
    }
}

/// Entry point to accounts, posts and media
#[derive(Clone)]
pub struct BackendFacade {
    client: BackendClient,
    identity: Arc<dyn IdentityApi>,
    documents: Arc<dyn DocumentApi>,
    storage: Arc<dyn StorageApi>,
    avatars: Avatars,
    collections: Collections,
}

impl BackendFacade {
    /// Create a facade talking to the hosted backend
    pub fn connect(config: BackendConfig) -> ServiceResult<Self> {
        let client = BackendClient::new(config)?;

        Ok(Self::new(
            client.clone(),
            Arc::new(AccountClient::new(client.clone())),
            Arc::new(DatabaseClient::new(client.clone())),
            Arc::new(StorageClient::new(client)),
        ))
    }

    /// Create a facade over the given collaborators
    pub fn new(
        client: BackendClient,
        identity: Arc<dyn IdentityApi>,
        documents: Arc<dyn DocumentApi>,
        storage: Arc<dyn StorageApi>,
    ) -> Self {
        let collections = Collections::from(client.config());
        let avatars = Avatars::new(client.clone());

        Self {
            client,
            identity,
            documents,
            storage,
            avatars,
            collections,
        }
    }

    /// Connection handle holding the current session
    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Sign up: create the account, sign in and create the user document.
    ///
    /// Steps already completed are not undone when a later one fails.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> ApiResult<UserAccount> {
        info!("Registering user: {}", username);

        validate_registration(email, password, username).map_err(ApiError::Registration)?;

        let identity = self
            .identity
            .create_identity(&id::unique(), email, password, username)
            .await
            .map_err(report("Failed to create account", ApiError::Registration))?;

        let avatar = self
            .avatars
            .initials_url(username)
            .map_err(report("Failed to build avatar", ApiError::Registration))?;

        self.identity
            .create_email_session(email, password)
            .await
            .map_err(report("Failed to sign in new account", ApiError::Registration))?;

        let new_user = NewUserAccount {
            account_id: identity.id,
            email: email.to_string(),
            username: username.to_string(),
            avatar: avatar.to_string(),
        };

        self.create_document(&self.collections.users, &new_user)
            .await
            .map_err(report("Failed to create user document", ApiError::Registration))
    }

    /// Open a session with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        info!("Signing in: {}", email);

        self.identity
            .create_email_session(email, password)
            .await
            .map_err(report("Failed to sign in", ApiError::Auth))
    }

    /// Close the current session
    pub async fn sign_out(&self) -> ApiResult<()> {
        info!("Signing out");

        self.identity
            .delete_current_session()
            .await
            .map_err(report("Failed to sign out", ApiError::Auth))
    }

    /// Profile of the signed-in user.
    ///
    /// Fails without a session; `None` when the account has no user document.
    pub async fn get_current_user(&self) -> ApiResult<Option<UserAccount>> {
        let identity = self
            .identity
            .get_identity()
            .await
            .map_err(report("Failed to resolve current account", ApiError::Auth))?;

        let users: DocumentList<UserAccount> = self
            .list(
                &self.collections.users,
                &[Query::equal("accountId", identity.id.as_str())],
            )
            .await
            .map_err(report("Failed to look up user document", ApiError::Auth))?;

        Ok(users.documents.into_iter().next())
    }

    /// Every post, in the service's default order
    pub async fn list_all_posts(&self) -> ApiResult<Vec<Post>> {
        self.list_posts(&[]).await
    }

    /// Most recent posts first, at most `limit` of them
    pub async fn list_latest_posts(&self, limit: u32) -> ApiResult<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut posts = self
            .list_posts(&[Query::order_desc(CREATED_AT), Query::limit(limit)])
            .await?;
        posts.truncate(limit as usize);

        Ok(posts)
    }

    /// Posts whose title matches `query`
    pub async fn search_posts(&self, query: &str) -> ApiResult<Vec<Post>> {
        info!("Searching posts for: {}", query);

        self.list_posts(&[Query::search("title", query)]).await
    }

    /// Posts created by the user document `user_id`
    pub async fn list_user_posts(&self, user_id: &str) -> ApiResult<Vec<Post>> {
        self.list_posts(&[Query::equal("creator", user_id)]).await
    }

    /// URL of an asset, with the kind given as text
    pub async fn get_asset_url(&self, asset_id: &str, kind: &str) -> ApiResult<Url> {
        let kind: AssetKind = kind.parse()?;
        self.asset_url(asset_id, kind)
    }

    /// URL of an asset: a preview rendering for images, the file itself for
    /// videos
    pub fn asset_url(&self, asset_id: &str, kind: AssetKind) -> ApiResult<Url> {
        self.render_url(asset_id, kind)
            .map_err(report("Failed to build asset URL", ApiError::Query))
    }

    /// Upload a picked file and return its URL.
    ///
    /// Nothing is uploaded and `None` is returned when no file was picked.
    pub async fn upload_asset(
        &self,
        handle: Option<&FileHandle>,
        kind: AssetKind,
    ) -> ApiResult<Option<Url>> {
        let Some(handle) = handle else {
            return Ok(None);
        };

        self.store_asset(handle, kind).await.map(Some)
    }

    /// Publish a video: upload thumbnail and video side by side, then create
    /// the post document.
    ///
    /// If one upload fails the other is abandoned and no document is created;
    /// an asset that did finish uploading is left in the bucket.
    pub async fn upload_post(&self, form: PostForm) -> ApiResult<Post> {
        info!("Uploading post \"{}\" for user {}", form.title, form.user_id);

        let (thumbnail, video) = tokio::try_join!(
            self.store_asset(&form.thumbnail, AssetKind::Image),
            self.store_asset(&form.video, AssetKind::Video),
        )?;

        let new_post = NewPost {
            title: form.title,
            prompt: form.prompt,
            thumbnail: thumbnail.to_string(),
            video: video.to_string(),
            creator: form.user_id,
        };

        self.create_document(&self.collections.videos, &new_post)
            .await
            .map_err(report("Failed to create post", ApiError::Query))
    }

    async fn store_asset(&self, handle: &FileHandle, kind: AssetKind) -> ApiResult<Url> {
        let upload = handle
            .read()
            .await
            .map_err(report("Failed to read file", ApiError::Upload))?;

        let stored = self
            .storage
            .create_file(&self.collections.bucket, &id::unique(), upload)
            .await
            .map_err(report("Failed to upload file", ApiError::Upload))?;

        self.render_url(&stored.id, kind)
            .map_err(report("Failed to build asset URL", ApiError::Upload))
    }

    fn render_url(&self, asset_id: &str, kind: AssetKind) -> ServiceResult<Url> {
        match kind {
            AssetKind::Image => self.storage.preview_url(
                &self.collections.bucket,
                asset_id,
                &PreviewOptions::default(),
            ),
            AssetKind::Video => self.storage.view_url(&self.collections.bucket, asset_id),
        }
    }

    async fn list_posts(&self, queries: &[Query]) -> ApiResult<Vec<Post>> {
        let posts: DocumentList<Post> = self
            .list(&self.collections.videos, queries)
            .await
            .map_err(report("Failed to list posts", ApiError::Query))?;

        Ok(posts.documents)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> ServiceResult<DocumentList<T>> {
        let page = self
            .documents
            .list_documents(&self.collections.database, collection, queries)
            .await?;

        let documents = page
            .documents
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;

        Ok(DocumentList {
            total: page.total,
            documents,
        })
    }

    async fn create_document<T: DeserializeOwned, D: Serialize>(
        &self,
        collection: &str,
        data: &D,
    ) -> ServiceResult<T> {
        let document = self
            .documents
            .create_document(
                &self.collections.database,
                collection,
                &id::unique(),
                serde_json::to_value(data)?,
            )
            .await?;

        Ok(serde_json::from_value(document)?)
    }
}
