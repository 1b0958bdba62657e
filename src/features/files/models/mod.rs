pub mod audit;
pub mod file;
pub mod permission;
pub mod share_link;

pub use audit::AuditAction;
pub use file::{File, FileWithOwner};
pub use permission::{FilePermission, PermissionRole};
pub use share_link::ShareLink;
