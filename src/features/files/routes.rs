use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::dtos::{MAX_FILES_PER_UPLOAD, MAX_FILE_SIZE};
use crate::features::files::handlers;
use crate::features::files::services::{FileService, PermissionLedger, ShareLinkService};

/// Largest accepted upload body: a full batch plus 1 MB of multipart overhead
const UPLOAD_BODY_LIMIT: usize = MAX_FILES_PER_UPLOAD * MAX_FILE_SIZE + 1024 * 1024;

/// Create routes for the files feature. All of them expect an authenticated user.
pub fn routes(
    file_service: Arc<FileService>,
    ledger: Arc<PermissionLedger>,
    share_link_service: Arc<ShareLinkService>,
) -> Router {
    let file_routes = Router::new()
        .route(
            "/api/v1/file/upload",
            post(handlers::upload_files).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/file/my-uploads", get(handlers::list_my_uploads))
        .route(
            "/api/v1/file/{file_id}/download",
            get(handlers::download_file),
        )
        .with_state(file_service);

    let permission_routes = Router::new()
        .route(
            "/api/v1/file/{file_id}/share/users",
            post(handlers::share_with_users),
        )
        .route(
            "/api/v1/file/shared-with-me",
            get(handlers::list_shared_with_me),
        )
        .with_state(ledger);

    let share_link_routes = Router::new()
        .route(
            "/api/v1/file/{file_id}/share/link",
            post(handlers::create_share_link),
        )
        .route(
            "/api/v1/file/share/{token}",
            get(handlers::redeem_share_link),
        )
        .with_state(share_link_service);

    file_routes
        .merge(permission_routes)
        .merge(share_link_routes)
}
