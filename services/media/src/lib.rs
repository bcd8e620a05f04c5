//! Media storage for the Aora backend client
//!
//! Uploads thumbnails and videos to a storage bucket and builds the URLs the
//! app uses to display them.

pub mod storage;
pub mod upload;

pub use storage::{Gravity, PreviewOptions, StorageApi, StorageClient};
pub use upload::{FileHandle, FileSource, FileUpload};
