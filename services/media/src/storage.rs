//! Bucket storage for thumbnails and videos

use async_trait::async_trait;
use common::{BackendClient, ServiceError, ServiceResult, models::StoredFile};
use reqwest::{
    Method,
    header::CONTENT_RANGE,
    multipart::{Form, Part},
};
use std::fmt;
use tracing::info;
use url::Url;

use crate::upload::FileUpload;

/// Largest payload accepted in a single upload request
pub const CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Header naming the file that a follow-up chunk belongs to
const UPLOAD_ID_HEADER: &str = "x-appwrite-id";

/// Anchor kept in view when a preview is cropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gravity {
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Gravity::Center => "center",
            Gravity::Top => "top",
            Gravity::Bottom => "bottom",
            Gravity::Left => "left",
            Gravity::Right => "right",
        };
        f.write_str(value)
    }
}

/// Rendering parameters of an image preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    pub width: u32,
    pub height: u32,
    pub gravity: Gravity,
    pub quality: u8,
}

impl Default for PreviewOptions {
    /// 2000x2000, cropped from the top, full quality
    fn default() -> Self {
        Self {
            width: 2000,
            height: 2000,
            gravity: Gravity::Top,
            quality: 100,
        }
    }
}

/// Object storage operations of the hosted backend
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Store `upload` in `bucket` under `file_id`
    async fn create_file(
        &self,
        bucket: &str,
        file_id: &str,
        upload: FileUpload,
    ) -> ServiceResult<StoredFile>;

    /// URL of a rendered preview of an image file
    fn preview_url(
        &self,
        bucket: &str,
        file_id: &str,
        options: &PreviewOptions,
    ) -> ServiceResult<Url>;

    /// URL serving the file content as stored
    fn view_url(&self, bucket: &str, file_id: &str) -> ServiceResult<Url>;
}

/// Preview URL of a stored file
pub fn file_preview_url(
    client: &BackendClient,
    bucket: &str,
    file_id: &str,
    options: &PreviewOptions,
) -> ServiceResult<Url> {
    client.public_url(
        &format!("storage/buckets/{}/files/{}/preview", bucket, file_id),
        &[
            ("width", options.width.to_string()),
            ("height", options.height.to_string()),
            ("gravity", options.gravity.to_string()),
            ("quality", options.quality.to_string()),
        ],
    )
}

/// Direct view URL of a stored file
pub fn file_view_url(client: &BackendClient, bucket: &str, file_id: &str) -> ServiceResult<Url> {
    client.public_url(
        &format!("storage/buckets/{}/files/{}/view", bucket, file_id),
        &[],
    )
}

/// Byte range of one request of a chunked upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkSpan {
    index: usize,
    start: usize,
    /// Inclusive
    end: usize,
    total: usize,
}

impl ChunkSpan {
    fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }

    /// Every chunk after the first names the file it extends
    fn continues_upload(&self) -> bool {
        self.index > 0
    }
}

/// Split `total` bytes into spans of at most [`CHUNK_SIZE`]
fn chunk_spans(total: usize) -> Vec<ChunkSpan> {
    (0..total)
        .step_by(CHUNK_SIZE)
        .enumerate()
        .map(|(index, start)| ChunkSpan {
            index,
            start,
            end: (start + CHUNK_SIZE).min(total) - 1,
            total,
        })
        .collect()
}

/// Storage client over the REST API
#[derive(Clone)]
pub struct StorageClient {
    client: BackendClient,
}

impl StorageClient {
    /// Create a new storage client
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    fn form(file_id: &str, upload: &FileUpload, chunk: &[u8]) -> ServiceResult<Form> {
        let part = Part::bytes(chunk.to_vec())
            .file_name(upload.name.clone())
            .mime_str(&upload.mime_type)?;

        Ok(Form::new()
            .text("fileId", file_id.to_string())
            .part("file", part))
    }
}

#[async_trait]
impl StorageApi for StorageClient {
    async fn create_file(
        &self,
        bucket: &str,
        file_id: &str,
        upload: FileUpload,
    ) -> ServiceResult<StoredFile> {
        let url = self
            .client
            .url(&format!("storage/buckets/{}/files", bucket))?;
        let total = upload.data.len();

        info!(
            "Uploading {} ({} bytes) to bucket {} as {}",
            upload.name, total, bucket, file_id
        );

        if total <= CHUNK_SIZE {
            let request = self
                .client
                .request(Method::POST, url)
                .await
                .multipart(Self::form(file_id, &upload, &upload.data)?);

            return self.client.send(request).await;
        }

        // The last response describes the whole file
        let mut stored = None;
        for span in chunk_spans(total) {
            let chunk = &upload.data[span.start..=span.end];

            let mut request = self
                .client
                .request(Method::POST, url.clone())
                .await
                .header(CONTENT_RANGE, span.content_range())
                .multipart(Self::form(file_id, &upload, chunk)?);

            if span.continues_upload() {
                request = request.header(UPLOAD_ID_HEADER, file_id);
            }

            stored = Some(self.client.send::<StoredFile>(request).await?);
        }

        stored.ok_or_else(|| ServiceError::InvalidResponse("Empty upload".to_string()))
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
    use common::BackendConfig;

    fn client() -> BackendClient {
        BackendClient::new(BackendConfig {
            endpoint: "https://cloud.appwrite.io/v1".to_string(),
            platform: "com.aora.app".to_string(),
            project_id: "aora".to_string(),
            database_id: "db".to_string(),
            user_collection_id: "users".to_string(),
            video_collection_id: "videos".to_string(),
            storage_id: "files".to_string(),
            request_timeout: 30,
        })
        .unwrap()
    }

    #[test]
    fn test_preview_url_uses_fixed_rendering() {
        let storage = StorageClient::new(client());

        let url = storage
            .preview_url("files", "abc", &PreviewOptions::default())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.appwrite.io/v1/storage/buckets/files/files/abc/preview?width=2000&height=2000&gravity=top&quality=100&project=aora"
        );
    }

    #[test]
    fn test_view_url() {
        let storage = StorageClient::new(client());

        let url = storage.view_url("files", "abc").unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.appwrite.io/v1/storage/buckets/files/files/abc/view?project=aora"
        );
    }

    #[test]
    fn test_chunk_spans_at_chunk_size() {
        let spans = chunk_spans(CHUNK_SIZE);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content_range(), "bytes 0-5242879/5242880");
        assert!(!spans[0].continues_upload());
    }

    #[test]
    fn test_chunk_spans_one_byte_over() {
        let spans = chunk_spans(CHUNK_SIZE + 1);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].content_range(), "bytes 0-5242879/5242881");
        assert_eq!(spans[1].content_range(), "bytes 5242880-5242880/5242881");
        assert!(!spans[0].continues_upload());
        assert!(spans[1].continues_upload());
    }

    #[test]
    fn test_chunk_spans_cover_every_byte() {
        let total = 2 * CHUNK_SIZE + 1;
        let spans = chunk_spans(total);

        let ranges: Vec<String> = spans.iter().map(ChunkSpan::content_range).collect();
        assert_eq!(
            ranges,
            [
                "bytes 0-5242879/10485761",
                "bytes 5242880-10485759/10485761",
                "bytes 10485760-10485760/10485761",
            ]
        );
        let covered: usize = spans.iter().map(|span| span.end - span.start + 1).sum();
        assert_eq!(covered, total);
        assert_eq!(
            spans.iter().filter(|span| span.continues_upload()).count(),
            2
        );
    }

    #[test]
    fn test_chunk_spans_empty() {
        assert!(chunk_spans(0).is_empty());
    }

    #[test]
    fn test_multipart_form_accepts_mime_type() {
        let upload = FileUpload {
            name: "clip.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            data: vec![0; 16],
        };

        assert!(StorageClient::form("abc", &upload, &upload.data).is_ok());
    }
}
