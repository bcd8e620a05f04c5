//! Video post documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::user::UserAccount;

/// Creator of a post.
///
/// The `creator` attribute is a relationship to the users collection, so the
/// service returns either the bare document id or the expanded profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Creator {
    Id(String),
    Account(Box<UserAccount>),
}

impl Creator {
    /// Id of the creator's user document
    pub fn id(&self) -> &str {
        match self {
            Creator::Id(id) => id,
            Creator::Account(account) => &account.id,
        }
    }

    /// Expanded profile, when the service returned one
    pub fn account(&self) -> Option<&UserAccount> {
        match self {
            Creator::Id(_) => None,
            Creator::Account(account) => Some(account),
        }
    }
}

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    #[serde(rename = "$id")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prompt: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub video: String,
    #[serde(default)]
    pub creator: Option<Creator>,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Id of the creator's user document, if the relationship is set
    pub fn creator_id(&self) -> Option<&str> {
        self.creator.as_ref().map(Creator::id)
    }
}

/// Optional text attributes come back as `null` when unset
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// New post creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub prompt: String,
    pub thumbnail: String,
    pub video: String,
    pub creator: String,
}
