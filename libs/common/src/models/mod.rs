//! Records exchanged with the hosted backend

pub mod asset;
pub mod post;
pub mod session;
pub mod user;

// Re-export for convenience
pub use asset::{AssetKind, InvalidAssetKind, StoredFile};
pub use post::{Creator, NewPost, Post};
pub use session::Session;
pub use user::{Identity, NewUserAccount, UserAccount};

use serde::{Deserialize, Serialize};

/// Page of documents returned by a list call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList<T> {
    pub total: u64,
    pub documents: Vec<T>,
}
