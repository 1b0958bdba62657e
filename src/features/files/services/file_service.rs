use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{AuditLog, PermissionLedger};
use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{DownloadResponseDto, FileSummaryDto, IncomingFile};
use crate::features::files::models::{AuditAction, File};
use crate::modules::storage::{BlobLocator, BlobStore};

/// A file whose bytes are already in the blob store
struct StoredBlob {
    filename: String,
    mime_type: String,
    size: i64,
    locator: BlobLocator,
}

/// Upload, listing and download of files
pub struct FileService {
    pool: PgPool,
    blob_store: Arc<dyn BlobStore>,
}

impl FileService {
    pub fn new(pool: PgPool, blob_store: Arc<dyn BlobStore>) -> Self {
        Self { pool, blob_store }
    }

    /// Store a batch of files for `actor_id`.
    ///
    /// Bytes go to the blob store first. File rows, owner permissions and
    /// UPLOAD audit entries for the whole batch then commit in a single
    /// transaction. Blobs written before a failure are left behind and logged.
    pub async fn upload(
        &self,
        actor_id: Uuid,
        files: Vec<IncomingFile>,
    ) -> Result<Vec<FileSummaryDto>> {
        if files.is_empty() {
            return Err(AppError::BadRequest("No files uploaded".to_string()));
        }

        let owner = actor_id.to_string();
        let mut stored = Vec::with_capacity(files.len());

        for file in files {
            let key = self.blob_store.object_key(
                &owner,
                &Uuid::new_v4().to_string(),
                &file.filename,
            );
            let size = file.data.len() as i64;

            match self.blob_store.put(&key, file.data, &file.content_type).await {
                Ok(locator) => stored.push(StoredBlob {
                    filename: file.filename,
                    mime_type: file.content_type,
                    size,
                    locator,
                }),
                Err(e) => {
                    log_orphans(&stored);
                    return Err(e);
                }
            }
        }

        let created = match self.persist_batch(actor_id, &stored).await {
            Ok(created) => created,
            Err(e) => {
                log_orphans(&stored);
                return Err(e);
            }
        };

        info!("Files uploaded: count={}, owner={}", created.len(), actor_id);

        Ok(created.into_iter().map(FileSummaryDto::from).collect())
    }

    async fn persist_batch(&self, actor_id: Uuid, stored: &[StoredBlob]) -> Result<Vec<File>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(stored.len());

        for blob in stored {
            let file = sqlx::query_as::<_, File>(
                r#"
                INSERT INTO files (owner_id, filename, mime_type, size, blob_key, blob_url)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, owner_id, filename, mime_type, size, blob_key, blob_url, created_at
                "#,
            )
            .bind(actor_id)
            .bind(&blob.filename)
            .bind(&blob.mime_type)
            .bind(blob.size)
            .bind(&blob.locator.key)
            .bind(&blob.locator.url)
            .fetch_one(&mut *tx)
            .await?;

            PermissionLedger::grant_owner(&mut *tx, file.id, actor_id).await?;
            AuditLog::record(&mut *tx, file.id, actor_id, AuditAction::Upload).await?;

            created.push(file);
        }

        tx.commit().await?;

        Ok(created)
    }

    /// The actor's own files, newest first
    pub async fn list_my_uploads(&self, actor_id: Uuid) -> Result<Vec<FileSummaryDto>> {
        let files = sqlx::query_as::<_, File>(
            r#"
            SELECT id, owner_id, filename, mime_type, size, blob_key, blob_url, created_at
            FROM files
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files.into_iter().map(FileSummaryDto::from).collect())
    }

    /// Hand out a retrieval URL to a user holding an active permission
    pub async fn download(&self, actor_id: Uuid, file_id: Uuid) -> Result<DownloadResponseDto> {
        let file = sqlx::query_as::<_, File>(
            r#"
            SELECT id, owner_id, filename, mime_type, size, blob_key, blob_url, created_at
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let mut conn = self.pool.acquire().await?;

        let permitted = PermissionLedger::find(&mut *conn, file_id, actor_id)
            .await?
            .is_some_and(|permission| permission.grants_access_at(Utc::now()));

        if !permitted {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        let url = self.blob_store.retrieval_url(&file.blob_key).await?;

        AuditLog::record(&mut *conn, file.id, actor_id, AuditAction::Download).await?;

        info!("File downloaded: file_id={}, by={}", file.id, actor_id);

        Ok(DownloadResponseDto {
            id: file.id,
            filename: file.filename,
            mime_type: file.mime_type,
            size: file.size,
            url,
        })
    }
}

fn log_orphans(stored: &[StoredBlob]) {
    for blob in stored {
        warn!(
            "Orphaned blob left after failed upload: key={}",
            blob.locator.key
        );
    }
}
