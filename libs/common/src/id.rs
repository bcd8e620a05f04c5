//! Identifier generation for new remote records

use uuid::Uuid;

/// Maximum id length accepted by the service
pub const MAX_ID_LEN: usize = 36;

/// Generate a fresh id for a document, file or account.
///
/// Ids are 32 lowercase hex characters, which satisfies the service rule of
/// at most 36 characters from `[a-zA-Z0-9._-]` not starting with a symbol.
pub fn unique() -> String {
    Uuid::new_v4().simple().to_string()
}
