mod audit_log;
mod file_service;
mod permission_ledger;
mod share_link_service;

pub use audit_log::AuditLog;
pub use file_service::FileService;
pub use permission_ledger::PermissionLedger;
pub use share_link_service::ShareLinkService;
