//! Document database access

use async_trait::async_trait;
use common::{BackendClient, ServiceResult, models::DocumentList};
use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

/// Attribute holding the creation time of every document
pub const CREATED_AT: &str = "$createdAt";

/// Filter, ordering or paging clause of a list call
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Attribute equals one of the values
    Equal { attribute: String, values: Vec<Value> },
    /// Full-text match on an indexed attribute
    Search { attribute: String, value: String },
    /// Descending order on an attribute
    OrderDesc { attribute: String },
    /// Maximum number of documents returned
    Limit(u32),
}

impl Query {
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Query::Equal {
            attribute: attribute.to_string(),
            values: vec![value.into()],
        }
    }

    pub fn search(attribute: &str, value: &str) -> Self {
        Query::Search {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }

    pub fn order_desc(attribute: &str) -> Self {
        Query::OrderDesc {
            attribute: attribute.to_string(),
        }
    }

    pub fn limit(limit: u32) -> Self {
        Query::Limit(limit)
    }

    /// JSON form sent in the `queries[]` parameter
    pub fn to_json(&self) -> Value {
        match self {
            Query::Equal { attribute, values } => json!({
                "method": "equal",
                "attribute": attribute,
                "values": values,
            }),
            Query::Search { attribute, value } => json!({
                "method": "search",
                "attribute": attribute,
                "values": [value],
            }),
            Query::OrderDesc { attribute } => json!({
                "method": "orderDesc",
                "attribute": attribute,
            }),
            Query::Limit(limit) => json!({
                "method": "limit",
                "values": [limit],
            }),
        }
    }
}

/// Document database operations of the hosted backend
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Create a document in a collection and return it as stored
    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> ServiceResult<Value>;

    /// List the documents of a collection matching `queries`
    async fn list_documents(
        &self,
        database: &str,
        collection: &str,
        queries: &[Query],
    ) -> ServiceResult<DocumentList<Value>>;
}

/// Database client over the REST API
#[derive(Clone)]
pub struct DatabaseClient {
    client: BackendClient,
}

impl DatabaseClient {
    /// Create a new database client
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    fn documents_path(database: &str, collection: &str) -> String {
        format!(
            "databases/{}/collections/{}/documents",
            database, collection
        )
    }
}

#[async_trait]
impl DocumentApi for DatabaseClient {
    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> ServiceResult<Value> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct CreateDocumentRequest<'a> {
            document_id: &'a str,
            data: Value,
        }

        info!("Creating document {} in {}", document_id, collection);

        let url = self.client.url(&Self::documents_path(database, collection))?;
        let request = self
            .client
            .request(Method::POST, url)
            .await
            .json(&CreateDocumentRequest { document_id, data });

        self.client.send(request).await
    }

    async fn list_documents(
        &self,
        database: &str,
        collection: &str,
        queries: &[Query],
    ) -> ServiceResult<DocumentList<Value>> {
        let url = self.client.url(&Self::documents_path(database, collection))?;
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|query| ("queries[]", query.to_json().to_string()))
            .collect();

        let request = self
            .client
            .request(Method::GET, url)
            .await
            .query(&params);

        self.client.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_json() {
        assert_eq!(
            Query::equal("accountId", "a1").to_json(),
            json!({"method": "equal", "attribute": "accountId", "values": ["a1"]})
        );
        assert_eq!(
            Query::search("title", "sun set").to_json(),
            json!({"method": "search", "attribute": "title", "values": ["sun set"]})
        );
        assert_eq!(
            Query::order_desc(CREATED_AT).to_json(),
            json!({"method": "orderDesc", "attribute": "$createdAt"})
        );
        assert_eq!(
            Query::limit(5).to_json(),
            json!({"method": "limit", "values": [5]})
        );
    }

    #[test]
    fn test_documents_path() {
        assert_eq!(
            DatabaseClient::documents_path("db", "videos"),
            "databases/db/collections/videos/documents"
        );
    }
}
