//! Storage module for file bytes
//!
//! File bytes live in an external blob store; the rest of the service only
//! sees the [`BlobStore`] trait and the locator it returns.

mod minio_client;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use minio_client::MinIOClient;

/// Where an uploaded object can be found again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocator {
    /// Object key inside the store
    pub key: String,
    /// Stable (non-signed) URL of the object
    pub url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Build the object key for a new upload
    fn object_key(&self, owner_id: &str, blob_id: &str, filename: &str) -> String;

    /// Store bytes under `key`
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> Result<BlobLocator, AppError>;

    /// Time-limited URL the client can fetch the bytes from
    async fn retrieval_url(&self, key: &str) -> Result<String, AppError>;
}

/// Extension taken from the original filename, restricted to a short
/// alphanumeric suffix so it is safe inside an object key
pub fn safe_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 10
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext
        }
        _ => "bin",
    }
}
