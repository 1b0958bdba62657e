use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::files::models::AuditAction;

/// Append-only audit trail. Entries are written on the caller's connection
/// so they commit or roll back with the action they describe.
pub struct AuditLog;

impl AuditLog {
    pub async fn record(
        conn: &mut PgConnection,
        file_id: Uuid,
        user_id: Uuid,
        action: AuditAction,
    ) -> Result<()> {
        sqlx::query("INSERT INTO file_audits (file_id, user_id, action) VALUES ($1, $2, $3)")
            .bind(file_id)
            .bind(user_id)
            .bind(action)
            .execute(conn)
            .await?;

        debug!(
            "Audit: action={}, file_id={}, user_id={}",
            action.as_str(),
            file_id,
            user_id
        );

        Ok(())
    }
}
