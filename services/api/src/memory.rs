//! In-memory backend
//!
//! Implements the account, database and storage APIs against process-local
//! state, following the service's observable rules (one session at a time,
//! authenticated writes, default page size). Used by the tests and for
//! running the app without a network.

use async_trait::async_trait;
use auth::IdentityApi;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use common::{
    BackendClient, ServiceError, ServiceResult,
    models::{DocumentList, Identity, Session, StoredFile},
};
use media::{
    FileUpload, PreviewOptions, StorageApi,
    storage::{file_preview_url, file_view_url},
};
use serde_json::{Map, Value};
use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::info;
use url::Url;

use crate::{
    documents::{CREATED_AT, DocumentApi, Query},
    facade::BackendFacade,
};

/// Page size applied when a list call sets no limit
pub const DEFAULT_LIST_LIMIT: usize = 25;

/// Lifetime of a session
const SESSION_TTL_DAYS: i64 = 365;

#[derive(Debug)]
struct Account {
    identity: Identity,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    /// Accounts keyed by email
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    /// Documents keyed by "database/collection", in creation order
    collections: HashMap<String, Vec<Value>>,
    /// Files keyed by "bucket/file"
    files: HashMap<String, (StoredFile, Vec<u8>)>,
    rejected_uploads: HashSet<String>,
    ticks: i64,
}

/// Backend kept entirely in memory
pub struct InMemoryBackend {
    client: BackendClient,
    epoch: DateTime<Utc>,
    state: Mutex<State>,
}

impl InMemoryBackend {
    /// Create a new in-memory backend; `client` only supplies the
    /// configuration used to build asset URLs
    pub fn new(client: BackendClient) -> Arc<Self> {
        Arc::new(Self {
            client,
            epoch: Utc::now(),
            state: Mutex::new(State::default()),
        })
    }

    /// Facade running on this backend
    pub fn facade(self: &Arc<Self>) -> BackendFacade {
        BackendFacade::new(
            self.client.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
        )
    }

    /// Make every later upload of a file called `name` fail
    pub async fn reject_uploads_named(&self, name: &str) {
        self.state
            .lock()
            .await
            .rejected_uploads
            .insert(name.to_string());
    }

    /// Number of documents stored in a collection
    pub async fn document_count(&self, database: &str, collection: &str) -> usize {
        self.state
            .lock()
            .await
            .collections
            .get(&collection_key(database, collection))
            .map_or(0, Vec::len)
    }

    /// Number of files stored in a bucket
    pub async fn file_count(&self, bucket: &str) -> usize {
        self.state
            .lock()
            .await
            .files
            .values()
            .filter(|(file, _)| file.bucket_id == bucket)
            .count()
    }

    fn timestamp(&self, state: &mut State) -> DateTime<Utc> {
        state.ticks += 1;
        self.epoch + Duration::milliseconds(state.ticks)
    }
}

fn collection_key(database: &str, collection: &str) -> String {
    format!("{}/{}", database, collection)
}

fn unauthorized() -> ServiceError {
    ServiceError::unauthorized(
        "general_unauthorized_scope",
        "User (role: guests) missing scope (account)",
    )
}

fn conflict(kind: &str, message: &str) -> ServiceError {
    ServiceError::Api {
        status: 409,
        kind: kind.to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl IdentityApi for InMemoryBackend {
    async fn create_identity(
        &self,
        id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> ServiceResult<Identity> {
        let mut state = self.state.lock().await;

        if state.accounts.contains_key(email) {
            return Err(conflict(
                "user_already_exists",
                "A user with the same id, email, or phone already exists in this project.",
            ));
        }

        let identity = Identity {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: self.timestamp(&mut state),
        };
        state.accounts.insert(
            email.to_string(),
            Account {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );

        info!("Created in-memory account {}", id);
        Ok(identity)
    }

    async fn create_email_session(&self, email: &str, password: &str) -> ServiceResult<Session> {
        let mut state = self.state.lock().await;

        if state.session.is_some() {
            return Err(ServiceError::unauthorized(
                "user_session_already_exists",
                "Creation of a session is prohibited when a session is active.",
            ));
        }

        let user_id = match state.accounts.get(email) {
            Some(account) if account.password == password => account.identity.id.clone(),
            _ => {
                return Err(ServiceError::unauthorized(
                    "user_invalid_credentials",
                    "Invalid credentials. Please check the email and password.",
                ));
            }
        };

        let created = self.timestamp(&mut state);
        let session = Session {
            id: common::id::unique(),
            user_id,
            expire: created + Duration::days(SESSION_TTL_DAYS),
            current: true,
        };
        state.session = Some(session.clone());

        Ok(session)
    }

    async fn get_identity(&self) -> ServiceResult<Identity> {
        let state = self.state.lock().await;
        let session = state.session.as_ref().ok_or_else(unauthorized)?;

        state
            .accounts
            .values()
            .find(|account| account.identity.id == session.user_id)
            .map(|account| account.identity.clone())
            .ok_or_else(unauthorized)
    }

    async fn delete_current_session(&self) -> ServiceResult<()> {
        let mut state = self.state.lock().await;

        match state.session.take() {
            Some(_) => Ok(()),
            None => Err(unauthorized()),
        }
    }
}

#[async_trait]
impl DocumentApi for InMemoryBackend {
    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> ServiceResult<Value> {
        let mut state = self.state.lock().await;

        if state.session.is_none() {
            return Err(ServiceError::unauthorized(
                "user_unauthorized",
                "The current user is not authorized to perform the requested action.",
            ));
        }

        let Value::Object(fields) = data else {
            return Err(ServiceError::Api {
                status: 400,
                kind: "document_invalid_structure".to_string(),
                message: "Invalid document structure: data must be an object".to_string(),
            });
        };

        let key = collection_key(database, collection);
        let exists = state.collections.get(&key).is_some_and(|documents| {
            documents
                .iter()
                .any(|document| document["$id"] == document_id)
        });
        if exists {
            return Err(conflict(
                "document_already_exists",
                "Document with the requested ID already exists.",
            ));
        }

        let created = self
            .timestamp(&mut state)
            .to_rfc3339_opts(SecondsFormat::Millis, false);
        let mut document = Map::new();
        document.insert("$id".to_string(), Value::from(document_id));
        document.insert("$collectionId".to_string(), Value::from(collection));
        document.insert("$databaseId".to_string(), Value::from(database));
        document.insert(CREATED_AT.to_string(), Value::from(created.clone()));
        document.insert("$updatedAt".to_string(), Value::from(created));
        document.extend(fields);

        let document = Value::Object(document);
        state
            .collections
            .entry(key)
            .or_default()
            .push(document.clone());

        Ok(document)
    }

    async fn list_documents(
        &self,
        database: &str,
        collection: &str,
        queries: &[Query],
    ) -> ServiceResult<DocumentList<Value>> {
        let state = self.state.lock().await;

        let mut documents: Vec<Value> = state
            .collections
            .get(&collection_key(database, collection))
            .cloned()
            .unwrap_or_default();

        let mut limit = DEFAULT_LIST_LIMIT;
        for query in queries {
            match query {
                Query::Equal { attribute, values } => {
                    documents.retain(|document| {
                        values.iter().any(|value| equals(&document[attribute], value))
                    });
                }
                Query::Search { attribute, value } => {
                    documents.retain(|document| matches_search(&document[attribute], value));
                }
                Query::OrderDesc { attribute } => {
                    documents.sort_by(|a, b| compare(&b[attribute], &a[attribute]));
                }
                Query::Limit(n) => limit = *n as usize,
            }
        }

        let total = documents.len() as u64;
        documents.truncate(limit);

        Ok(DocumentList { total, documents })
    }
}

/// Equality as the service applies it: relationship attributes compare by
/// the related document id
fn equals(attribute: &Value, expected: &Value) -> bool {
    match attribute {
        Value::Object(related) => related.get("$id") == Some(expected),
        other => other == expected,
    }
}

/// Full-text match: some word of the query prefixes some word of the text,
/// ignoring case. An empty query matches everything.
fn matches_search(attribute: &Value, query: &str) -> bool {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return true;
    }

    let Some(text) = attribute.as_str() else {
        return false;
    };
    let text = text.to_lowercase();

    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| terms.iter().any(|term| word.starts_with(term.as_str())))
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl StorageApi for InMemoryBackend {
    async fn create_file(
        &self,
        bucket: &str,
        file_id: &str,
        upload: FileUpload,
    ) -> ServiceResult<StoredFile> {
        let mut state = self.state.lock().await;

        if state.session.is_none() {
            return Err(ServiceError::unauthorized(
                "user_unauthorized",
                "The current user is not authorized to perform the requested action.",
            ));
        }

        if state.rejected_uploads.contains(&upload.name) {
            return Err(ServiceError::Api {
                status: 400,
                kind: "storage_invalid_file".to_string(),
                message: format!("File {} could not be stored", upload.name),
            });
        }

        let key = collection_key(bucket, file_id);
        if state.files.contains_key(&key) {
            return Err(conflict(
                "storage_file_already_exists",
                "A storage file with the requested ID already exists.",
            ));
        }

        let file = StoredFile {
            id: file_id.to_string(),
            bucket_id: bucket.to_string(),
            name: upload.name,
            mime_type: upload.mime_type,
            size: upload.data.len() as u64,
            created_at: self.timestamp(&mut state),
        };
        state.files.insert(key, (file.clone(), upload.data));

        Ok(file)
    }

    fn preview_url(
        &self,
        bucket: &str,
        file_id: &str,
        options: &PreviewOptions,
    ) -> ServiceResult<Url> {
        file_preview_url(&self.client, bucket, file_id, options)
    }

    fn view_url(&self, bucket: &str, file_id: &str) -> ServiceResult<Url> {
        file_view_url(&self.client, bucket, file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_matches_word_prefixes() {
        let title = json!("Sunset over the Sea");

        assert!(matches_search(&title, "sun"));
        assert!(matches_search(&title, "SEA"));
        assert!(matches_search(&title, "moon sea"));
        assert!(matches_search(&title, ""));
        assert!(!matches_search(&title, "set"));
        assert!(!matches_search(&json!(null), "sun"));
    }

    #[test]
    fn test_equality_follows_relationships() {
        assert!(equals(&json!("u1"), &json!("u1")));
        assert!(equals(&json!({"$id": "u1", "username": "alice"}), &json!("u1")));
        assert!(!equals(&json!({"$id": "u2"}), &json!("u1")));
    }

    #[test]
    fn test_compare_orders_nulls_first() {
        assert_eq!(compare(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(compare(&json!(null), &json!("a")), Ordering::Less);
    }
}
