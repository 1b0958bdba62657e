use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A bearer link to a file. Only the SHA-256 of the token is persisted.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct ShareLink {
    pub id: Uuid,
    pub file_id: Uuid,
    pub token_hash: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ShareLink {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}
