//! Account identity and user profile documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote account identity, owner of sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
}

/// User profile document in the users collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub email: String,
    pub username: String,
    pub avatar: String,
}

/// New user document creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserAccount {
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub email: String,
    pub username: String,
    pub avatar: String,
}
