use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::files::models::File;

/// Maximum size of a single uploaded file (5 MiB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Maximum number of files in one upload request
pub const MAX_FILES_PER_UPLOAD: usize = 10;

/// Multipart field carrying the files
pub const UPLOAD_FIELD_NAME: &str = "files";

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Upload request DTO for OpenAPI documentation.
/// The handler reads axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFilesDto {
    /// File to upload. Repeat the `files` field for each file.
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub files: String,
}

/// A file received from the client, before it is stored
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// File summary returned by upload and my-uploads (never the blob locator)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileSummaryDto {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    /// Size in bytes
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<File> for FileSummaryDto {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            filename: file.filename,
            mime_type: file.mime_type,
            size: file.size,
            uploaded_at: file.created_at,
        }
    }
}

/// Download response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponseDto {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    /// Time-limited URL the bytes can be fetched from
    pub url: String,
}
