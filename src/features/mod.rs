pub mod auth;
pub mod files;
