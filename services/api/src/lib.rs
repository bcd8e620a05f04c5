//! Backend facade of the Aora video sharing app
//!
//! Combines the account, document and storage APIs of the hosted backend
//! into the operations the app screens call: signing up and in, listing and
//! searching posts, and publishing videos.

pub mod documents;
pub mod error;
pub mod facade;
pub mod memory;

pub use documents::{DatabaseClient, DocumentApi, Query};
pub use error::{ApiError, ApiResult};
pub use facade::{BackendFacade, DEFAULT_LATEST_POSTS, PostForm};
pub use memory::InMemoryBackend;
