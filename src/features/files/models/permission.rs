use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Role a user holds on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "permission_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionRole {
    Owner,
    Viewer,
}

/// One row of the permission ledger. At most one per (file, user).
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct FilePermission {
    pub id: Uuid,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub role: PermissionRole,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilePermission {
    /// Owners never expire; viewers are active until `expires_at` (exclusive)
    pub fn grants_access_at(&self, now: DateTime<Utc>) -> bool {
        match self.role {
            PermissionRole::Owner => true,
            PermissionRole::Viewer => self.expires_at.is_none_or(|expires_at| expires_at > now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn permission(role: PermissionRole, expires_at: Option<DateTime<Utc>>) -> FilePermission {
        let now = Utc::now();
        FilePermission {
            id: Uuid::new_v4(),
            file_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role,
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_viewer_without_expiry_is_active() {
        let p = permission(PermissionRole::Viewer, None);
        assert!(p.grants_access_at(Utc::now()));
    }

    #[test]
    fn test_viewer_expiry_boundary() {
        let now = Utc::now();
        let p = permission(PermissionRole::Viewer, Some(now));

        assert!(p.grants_access_at(now - Duration::seconds(1)));
        assert!(!p.grants_access_at(now));
        assert!(!p.grants_access_at(now + Duration::seconds(1)));
    }

    #[test]
    fn test_owner_is_always_active() {
        let past = Utc::now() - Duration::days(1);
        let p = permission(PermissionRole::Owner, Some(past));
        assert!(p.grants_access_at(Utc::now()));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(PermissionRole::Viewer).unwrap(),
            "viewer"
        );
    }
}
