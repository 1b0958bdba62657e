use serde::{Deserialize, Serialize};

/// Actions recorded in the file audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Upload,
    ShareUser,
    ShareLink,
    Download,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Upload => "UPLOAD",
            AuditAction::ShareUser => "SHARE_USER",
            AuditAction::ShareLink => "SHARE_LINK",
            AuditAction::Download => "DOWNLOAD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_match_serde() {
        for action in [
            AuditAction::Upload,
            AuditAction::ShareUser,
            AuditAction::ShareLink,
            AuditAction::Download,
        ] {
            assert_eq!(serde_json::to_value(action).unwrap(), action.as_str());
        }
    }
}
