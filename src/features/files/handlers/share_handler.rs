use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppPath};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    CreateShareLinkDto, SharedFileDto, ShareLinkResponseDto, ShareWithUsersDto,
    ShareWithUsersResponseDto,
};
use crate::features::files::services::{PermissionLedger, ShareLinkService};
use crate::shared::types::{ApiResponse, Meta};

/// Grant viewer access on a file to other users
#[utoipa::path(
    post,
    path = "/api/v1/file/{file_id}/share/users",
    tag = "sharing",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    request_body = ShareWithUsersDto,
    responses(
        (status = 200, description = "Access granted", body = ApiResponse<ShareWithUsersResponseDto>),
        (status = 400, description = "Empty or unknown userIds, or expiresAt in the past"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Caller is not the owner"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn share_with_users(
    user: AuthenticatedUser,
    AppPath(file_id): AppPath<Uuid>,
    State(ledger): State<Arc<PermissionLedger>>,
    AppJson(dto): AppJson<ShareWithUsersDto>,
) -> Result<Json<ApiResponse<ShareWithUsersResponseDto>>> {
    let result = ledger.share_with_users(user.user_id, file_id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(result),
        Some("File shared successfully".to_string()),
        None,
    )))
}

/// List files shared with the current user
#[utoipa::path(
    get,
    path = "/api/v1/file/shared-with-me",
    tag = "sharing",
    responses(
        (status = 200, description = "Files with an active viewer grant", body = ApiResponse<Vec<SharedFileDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_shared_with_me(
    user: AuthenticatedUser,
    State(ledger): State<Arc<PermissionLedger>>,
) -> Result<Json<ApiResponse<Vec<SharedFileDto>>>> {
    let files = ledger.list_shared_with_me(user.user_id).await?;
    let total = files.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Create a share link for a file
#[utoipa::path(
    post,
    path = "/api/v1/file/{file_id}/share/link",
    tag = "sharing",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    request_body(
        content = CreateShareLinkDto,
        description = "Optional; an empty body creates a link without expiry"
    ),
    responses(
        (status = 201, description = "Share link created; the URL is shown only once", body = ApiResponse<ShareLinkResponseDto>),
        (status = 400, description = "expiresAt in the past"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Caller is not the owner"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_share_link(
    user: AuthenticatedUser,
    AppPath(file_id): AppPath<Uuid>,
    State(service): State<Arc<ShareLinkService>>,
    body: Option<AppJson<CreateShareLinkDto>>,
) -> Result<(StatusCode, Json<ApiResponse<ShareLinkResponseDto>>)> {
    let dto = body.map(|AppJson(dto)| dto).unwrap_or_default();
    let link = service.create(user.user_id, file_id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(link),
            Some("Share link created".to_string()),
            None,
        )),
    ))
}

/// Resolve a share link to file metadata
#[utoipa::path(
    get,
    path = "/api/v1/file/share/{token}",
    tag = "sharing",
    params(
        ("token" = String, Path, description = "Share token from the share URL")
    ),
    responses(
        (status = 200, description = "Shared file metadata", body = ApiResponse<SharedFileDto>),
        (status = 400, description = "Missing token"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Invalid or expired share link")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn redeem_share_link(
    user: AuthenticatedUser,
    AppPath(token): AppPath<String>,
    State(service): State<Arc<ShareLinkService>>,
) -> Result<Json<ApiResponse<SharedFileDto>>> {
    let file = service.redeem(user.user_id, &token).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}
