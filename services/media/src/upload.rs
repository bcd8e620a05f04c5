//! Files picked for upload

use std::path::{Path, PathBuf};
use tracing::info;

/// Where the bytes of a picked file live
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    /// File on the local filesystem
    Path(PathBuf),
    /// Bytes already held in memory
    Memory(Vec<u8>),
}

/// Handle to a file chosen by the user
#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    pub name: String,
    pub mime_type: String,
    pub source: FileSource,
}

/// Payload sent to the storage service
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl FileHandle {
    /// Handle to a file on disk; name and mime type come from the path
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_type_for(&path).to_string();

        Self {
            name,
            mime_type,
            source: FileSource::Path(path),
        }
    }

    /// Handle to bytes held in memory
    pub fn from_bytes(name: &str, mime_type: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            source: FileSource::Memory(data),
        }
    }

    /// Load the file content
    pub async fn read(&self) -> std::io::Result<FileUpload> {
        let data = match &self.source {
            FileSource::Path(path) => {
                info!("Reading upload from: {}", path.display());
                tokio::fs::read(path).await?
            }
            FileSource::Memory(data) => data.clone(),
        };

        Ok(FileUpload {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            data,
        })
    }
}

/// Mime type for the media extensions the app accepts
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_infers_name_and_type() {
        let handle = FileHandle::from_path("/tmp/clips/Sunset.MP4");
        assert_eq!(handle.name, "Sunset.MP4");
        assert_eq!(handle.mime_type, "video/mp4");

        let handle = FileHandle::from_path("thumb.jpeg");
        assert_eq!(handle.mime_type, "image/jpeg");

        let handle = FileHandle::from_path("notes");
        assert_eq!(handle.mime_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let path = std::env::temp_dir().join(format!("aora-upload-{}.png", std::process::id()));
        tokio::fs::write(&path, b"\x89PNG").await.unwrap();

        let upload = FileHandle::from_path(&path).read().await.unwrap();
        assert_eq!(upload.mime_type, "image/png");
        assert_eq!(upload.data, b"\x89PNG");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let handle = FileHandle::from_path("/definitely/not/here.mp4");
        assert!(handle.read().await.is_err());
    }
}
