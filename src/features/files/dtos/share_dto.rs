use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::files::models::FileWithOwner;

/// Request DTO for granting viewer access to users
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareWithUsersDto {
    #[serde(default)]
    pub user_ids: Vec<Uuid>,
    /// Absent means the grant never expires
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareWithUsersResponseDto {
    /// Number of distinct users granted access
    pub shared_with: usize,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request DTO for creating a share link
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareLinkDto {
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// The share URL is only ever returned here; the token cannot be recovered later.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkResponseDto {
    pub share_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileOwnerDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// File metadata with the owner's identity, used by shared-with-me and
/// share-link redemption
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedFileDto {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
    pub owner: FileOwnerDto,
}

impl From<FileWithOwner> for SharedFileDto {
    fn from(row: FileWithOwner) -> Self {
        Self {
            id: row.id,
            filename: row.filename,
            mime_type: row.mime_type,
            size: row.size,
            uploaded_at: row.created_at,
            owner: FileOwnerDto {
                id: row.owner_id,
                name: row.owner_name,
                email: row.owner_email,
            },
        }
    }
}

/// Reject expiry timestamps that are already in the past
pub fn validate_expiry(
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), String> {
    match expires_at {
        Some(expires_at) if expires_at <= now => {
            Err("expiresAt must be in the future".to_string())
        }
        _ => Ok(()),
    }
}
