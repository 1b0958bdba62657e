use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for an uploaded file
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct File {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub blob_key: String,
    pub blob_url: String,
    pub created_at: DateTime<Utc>,
}

/// File metadata joined with the owner's public identity
#[derive(Debug, Clone, FromRow)]
pub struct FileWithOwner {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_email: String,
}
