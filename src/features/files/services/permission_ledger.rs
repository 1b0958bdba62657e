use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use super::AuditLog;
use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{
    validate_expiry, SharedFileDto, ShareWithUsersDto, ShareWithUsersResponseDto,
};
use crate::features::files::models::{AuditAction, FilePermission, FileWithOwner, PermissionRole};

/// Owns the (file, user) -> role mapping
pub struct PermissionLedger {
    pool: PgPool,
}

impl PermissionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record `user_id` as the owner of a freshly created file
    pub async fn grant_owner(conn: &mut PgConnection, file_id: Uuid, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO file_permissions (file_id, user_id, role)
            VALUES ($1, $2, 'owner')
            "#,
        )
        .bind(file_id)
        .bind(user_id)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn find(
        conn: &mut PgConnection,
        file_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<FilePermission>> {
        let permission = sqlx::query_as::<_, FilePermission>(
            r#"
            SELECT id, file_id, user_id, role, expires_at, created_at, updated_at
            FROM file_permissions
            WHERE file_id = $1 AND user_id = $2
            "#,
        )
        .bind(file_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        Ok(permission)
    }

    /// Fails with NotFound when the file does not exist and with Forbidden
    /// (carrying `denied_message`) when `actor_id` holds no owner permission
    pub async fn require_owner(
        conn: &mut PgConnection,
        file_id: Uuid,
        actor_id: Uuid,
        denied_message: &str,
    ) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM files WHERE id = $1)")
            .bind(file_id)
            .fetch_one(&mut *conn)
            .await?;

        if !exists {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        match Self::find(conn, file_id, actor_id).await? {
            Some(permission) if permission.role == PermissionRole::Owner => Ok(()),
            _ => Err(AppError::Forbidden(denied_message.to_string())),
        }
    }

    /// Grant viewer access on `file_id` to every user in the request.
    ///
    /// The ownership check, the bulk upsert and the SHARE_USER audit entry
    /// run in one transaction; an unknown user id rejects the whole batch.
    pub async fn share_with_users(
        &self,
        actor_id: Uuid,
        file_id: Uuid,
        dto: ShareWithUsersDto,
    ) -> Result<ShareWithUsersResponseDto> {
        if dto.user_ids.is_empty() {
            return Err(AppError::Validation(
                "userIds must be a non-empty array".to_string(),
            ));
        }
        validate_expiry(dto.expires_at, Utc::now()).map_err(AppError::Validation)?;

        let mut tx = self.pool.begin().await?;

        Self::require_owner(&mut *tx, file_id, actor_id, "You are not the owner of this file")
            .await?;

        let user_ids = grantees(dto.user_ids, actor_id);
        if user_ids.is_empty() {
            return Err(AppError::Validation(
                "userIds must include at least one user other than the owner".to_string(),
            ));
        }

        let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ANY($1)")
            .bind(&user_ids)
            .fetch_one(&mut *tx)
            .await?;

        if known != user_ids.len() as i64 {
            return Err(AppError::Validation(
                "One or more userIds are invalid".to_string(),
            ));
        }

        // The owner row for a pair is never downgraded to viewer.
        sqlx::query(
            r#"
            INSERT INTO file_permissions (file_id, user_id, role, expires_at)
            SELECT $1, grantee, 'viewer'::permission_role, $3
            FROM UNNEST($2::uuid[]) AS grantee
            ON CONFLICT (file_id, user_id) DO UPDATE
            SET role = EXCLUDED.role,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            WHERE file_permissions.role <> 'owner'
            "#,
        )
        .bind(file_id)
        .bind(&user_ids)
        .bind(dto.expires_at)
        .execute(&mut *tx)
        .await?;

        AuditLog::record(&mut *tx, file_id, actor_id, AuditAction::ShareUser).await?;

        tx.commit().await?;

        info!(
            "File shared: file_id={}, grantees={}, by={}",
            file_id,
            user_ids.len(),
            actor_id
        );

        Ok(ShareWithUsersResponseDto {
            shared_with: user_ids.len(),
            expires_at: dto.expires_at,
        })
    }

    /// Files other users have shared with `actor_id` that are still accessible
    pub async fn list_shared_with_me(&self, actor_id: Uuid) -> Result<Vec<SharedFileDto>> {
        let rows = sqlx::query_as::<_, FileWithOwner>(
            r#"
            SELECT f.id, f.filename, f.mime_type, f.size, f.created_at,
                   u.id AS owner_id, u.name AS owner_name, u.email AS owner_email
            FROM file_permissions p
            JOIN files f ON f.id = p.file_id
            JOIN users u ON u.id = f.owner_id
            WHERE p.user_id = $1
              AND p.role = 'viewer'
              AND (p.expires_at IS NULL OR p.expires_at > $2)
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(actor_id)
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SharedFileDto::from).collect())
    }
}

/// Distinct ids other than `owner`, keeping first-seen order
fn grantees(user_ids: Vec<Uuid>, owner: Uuid) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(user_ids.len());
    user_ids
        .into_iter()
        .filter(|id| *id != owner && seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::files::services::FileService;
    use crate::shared::test_helpers::{insert_user, upload_one, MemoryBlobStore};
    use chrono::Duration;
    use std::sync::Arc;

    #[test]
    fn test_grantees_dedup_keeps_first_occurrence() {
        let owner = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(grantees(vec![a, b, a, a, b], owner), vec![a, b]);
        assert!(grantees(vec![], owner).is_empty());
    }

    #[test]
    fn test_grantees_exclude_owner() {
        let owner = Uuid::new_v4();
        let a = Uuid::new_v4();

        assert_eq!(grantees(vec![owner, a, owner], owner), vec![a]);
        assert!(grantees(vec![owner, owner], owner).is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_regrant_updates_instead_of_duplicating(pool: PgPool) {
        let files = FileService::new(pool.clone(), Arc::new(MemoryBlobStore::default()));
        let ledger = PermissionLedger::new(pool.clone());
        let owner = insert_user(&pool, "owner@example.com").await;
        let viewer = insert_user(&pool, "viewer@example.com").await;
        let file = upload_one(&files, owner).await;

        let later = Utc::now() + Duration::hours(1);
        ledger
            .share_with_users(
                owner,
                file.id,
                ShareWithUsersDto {
                    user_ids: vec![viewer, viewer],
                    expires_at: Some(later),
                },
            )
            .await
            .unwrap();
        let result = ledger
            .share_with_users(
                owner,
                file.id,
                ShareWithUsersDto {
                    user_ids: vec![viewer],
                    expires_at: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(result.shared_with, 1);

        let rows: Vec<(PermissionRole, Option<chrono::DateTime<Utc>>)> = sqlx::query_as(
            "SELECT role, expires_at FROM file_permissions WHERE file_id = $1 AND user_id = $2",
        )
        .bind(file.id)
        .bind(viewer)
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, PermissionRole::Viewer);
        assert!(rows[0].1.is_none());

        let audits: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM file_audits WHERE file_id = $1 AND action = 'SHARE_USER'",
        )
        .bind(file.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(audits, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_unknown_user_rejects_whole_batch(pool: PgPool) {
        let files = FileService::new(pool.clone(), Arc::new(MemoryBlobStore::default()));
        let ledger = PermissionLedger::new(pool.clone());
        let owner = insert_user(&pool, "owner@example.com").await;
        let viewer = insert_user(&pool, "viewer@example.com").await;
        let file = upload_one(&files, owner).await;

        let err = ledger
            .share_with_users(
                owner,
                file.id,
                ShareWithUsersDto {
                    user_ids: vec![viewer, Uuid::new_v4()],
                    expires_at: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let grants: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM file_permissions WHERE role = 'viewer'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(grants, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_only_owner_can_share(pool: PgPool) {
        let files = FileService::new(pool.clone(), Arc::new(MemoryBlobStore::default()));
        let ledger = PermissionLedger::new(pool.clone());
        let owner = insert_user(&pool, "owner@example.com").await;
        let other = insert_user(&pool, "other@example.com").await;
        let file = upload_one(&files, owner).await;

        let err = ledger
            .share_with_users(
                other,
                file.id,
                ShareWithUsersDto {
                    user_ids: vec![owner],
                    expires_at: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let missing = ledger
            .share_with_users(
                owner,
                Uuid::new_v4(),
                ShareWithUsersDto {
                    user_ids: vec![other],
                    expires_at: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_sharing_with_self_keeps_single_owner(pool: PgPool) {
        let files = FileService::new(pool.clone(), Arc::new(MemoryBlobStore::default()));
        let ledger = PermissionLedger::new(pool.clone());
        let owner = insert_user(&pool, "owner@example.com").await;
        let viewer = insert_user(&pool, "viewer@example.com").await;
        let file = upload_one(&files, owner).await;

        let response = ledger
            .share_with_users(
                owner,
                file.id,
                ShareWithUsersDto {
                    user_ids: vec![owner, viewer],
                    expires_at: Some(Utc::now() + Duration::minutes(1)),
                },
            )
            .await
            .unwrap();
        assert_eq!(response.shared_with, 1);

        let only_self = ledger
            .share_with_users(
                owner,
                file.id,
                ShareWithUsersDto {
                    user_ids: vec![owner],
                    expires_at: None,
                },
            )
            .await;
        assert!(matches!(only_self, Err(AppError::Validation(_))));

        let owners: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM file_permissions WHERE file_id = $1 AND role = 'owner' AND expires_at IS NULL",
        )
        .bind(file.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(owners, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_shared_with_me_hides_expired_grants(pool: PgPool) {
        let files = FileService::new(pool.clone(), Arc::new(MemoryBlobStore::default()));
        let ledger = PermissionLedger::new(pool.clone());
        let owner = insert_user(&pool, "owner@example.com").await;
        let viewer = insert_user(&pool, "viewer@example.com").await;
        let active = upload_one(&files, owner).await;
        let expired = upload_one(&files, owner).await;

        for file_id in [active.id, expired.id] {
            ledger
                .share_with_users(
                    owner,
                    file_id,
                    ShareWithUsersDto {
                        user_ids: vec![viewer],
                        expires_at: Some(Utc::now() + Duration::hours(1)),
                    },
                )
                .await
                .unwrap();
        }
        sqlx::query(
            "UPDATE file_permissions SET expires_at = NOW() - INTERVAL '1 minute' WHERE file_id = $1 AND user_id = $2",
        )
        .bind(expired.id)
        .bind(viewer)
        .execute(&pool)
        .await
        .unwrap();

        let shared = ledger.list_shared_with_me(viewer).await.unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].id, active.id);
        assert_eq!(shared[0].owner.id, owner);

        assert!(ledger.list_shared_with_me(owner).await.unwrap().is_empty());
    }
}
