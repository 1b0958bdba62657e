use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AuditLog, PermissionLedger};
use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{
    validate_expiry, CreateShareLinkDto, SharedFileDto, ShareLinkResponseDto,
};
use crate::features::files::models::{AuditAction, FileWithOwner, ShareLink};

/// Random bytes per token (256 bits)
const TOKEN_BYTES: usize = 32;

const INVALID_LINK: &str = "Invalid or expired share link";

/// Issues and redeems bearer share links
pub struct ShareLinkService {
    pool: PgPool,
    share_base_url: String,
}

impl ShareLinkService {
    /// `frontend_url` is the base of the share URLs handed to owners
    pub fn new(pool: PgPool, frontend_url: &str) -> Self {
        Self {
            pool,
            share_base_url: format!("{}/share", frontend_url.trim_end_matches('/')),
        }
    }

    fn share_url(&self, token: &str) -> String {
        format!("{}/{}", self.share_base_url, token)
    }

    /// Create a link for a file the actor owns. The raw token appears only in
    /// the returned URL; the database keeps its hash.
    pub async fn create(
        &self,
        actor_id: Uuid,
        file_id: Uuid,
        dto: CreateShareLinkDto,
    ) -> Result<ShareLinkResponseDto> {
        validate_expiry(dto.expires_at, Utc::now()).map_err(AppError::Validation)?;

        let token = generate_token();
        let token_hash = hash_token(&token);

        let mut tx = self.pool.begin().await?;

        PermissionLedger::require_owner(
            &mut *tx,
            file_id,
            actor_id,
            "Only owner can create share link",
        )
        .await?;

        let link_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO share_links (file_id, token_hash, expires_at, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(file_id)
        .bind(&token_hash)
        .bind(dto.expires_at)
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await?;

        AuditLog::record(&mut *tx, file_id, actor_id, AuditAction::ShareLink).await?;

        tx.commit().await?;

        info!(
            "Share link created: link_id={}, file_id={}, by={}",
            link_id, file_id, actor_id
        );

        Ok(ShareLinkResponseDto {
            share_url: self.share_url(&token),
            expires_at: dto.expires_at,
        })
    }

    /// Resolve a presented token to file metadata.
    ///
    /// Unknown and expired tokens fail with the same NotFound error.
    pub async fn redeem(&self, actor_id: Uuid, token: &str) -> Result<SharedFileDto> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::BadRequest("Share token is required".to_string()));
        }

        let link = sqlx::query_as::<_, ShareLink>(
            r#"
            SELECT id, file_id, token_hash, expires_at, created_by, created_at
            FROM share_links
            WHERE token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?
        .filter(|link| link.is_valid_at(Utc::now()))
        .ok_or_else(|| {
            debug!("Share link lookup missed");
            AppError::NotFound(INVALID_LINK.to_string())
        })?;

        let file = sqlx::query_as::<_, FileWithOwner>(
            r#"
            SELECT f.id, f.filename, f.mime_type, f.size, f.created_at,
                   u.id AS owner_id, u.name AS owner_name, u.email AS owner_email
            FROM files f
            JOIN users u ON u.id = f.owner_id
            WHERE f.id = $1
            "#,
        )
        .bind(link.file_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(INVALID_LINK.to_string()))?;

        info!(
            "Share link redeemed: link_id={}, file_id={}, by={}",
            link.id, link.file_id, actor_id
        );

        Ok(file.into())
    }
}

/// URL-safe random token with 256 bits of entropy
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex-encoded SHA-256 of a share token
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
