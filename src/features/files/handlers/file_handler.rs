use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppPath;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    DownloadResponseDto, FileSummaryDto, IncomingFile, UploadFilesDto, DEFAULT_CONTENT_TYPE,
    MAX_FILES_PER_UPLOAD, MAX_FILE_SIZE, UPLOAD_FIELD_NAME,
};
use crate::features::files::services::FileService;
use crate::shared::types::{ApiResponse, Meta};

/// Longest content type the files table accepts
const MAX_CONTENT_TYPE_LEN: usize = 255;

/// Upload one or more files
#[utoipa::path(
    post,
    path = "/api/v1/file/upload",
    tag = "files",
    request_body(
        content = UploadFilesDto,
        content_type = "multipart/form-data",
        description = "Up to 10 files of at most 5 MB each, in the `files` field"
    ),
    responses(
        (status = 201, description = "Files uploaded", body = ApiResponse<Vec<FileSummaryDto>>),
        (status = 400, description = "No files, too many files, or file too large"),
        (status = 401, description = "Authentication required"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Blob store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_files(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<FileSummaryDto>>>)> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            debug!("Ignoring unknown field: {:?}", field.name());
            continue;
        }

        if files.len() == MAX_FILES_PER_UPLOAD {
            return Err(AppError::BadRequest(format!(
                "Too many files. At most {} files per upload",
                MAX_FILES_PER_UPLOAD
            )));
        }

        files.push(read_file_field(field).await?);
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".to_string()));
    }

    let created = service.upload(user.user_id, files).await?;
    let total = created.len() as i64;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(created),
            Some("Files uploaded successfully".to_string()),
            Some(Meta { total }),
        )),
    ))
}

/// Read one multipart file, enforcing the per-file size limit while streaming
async fn read_file_field(mut field: Field<'_>) -> Result<IncomingFile> {
    let filename = sanitize_filename(field.file_name());
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    if content_type.len() > MAX_CONTENT_TYPE_LEN {
        return Err(AppError::BadRequest("Content type is too long".to_string()));
    }

    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| {
        debug!("Failed to read file bytes: {}", e);
        AppError::BadRequest(format!("Failed to read file data: {}", e))
    })? {
        if data.len() + chunk.len() > MAX_FILE_SIZE {
            return Err(AppError::BadRequest(format!(
                "File '{}' is too large. Maximum size is {} MB",
                filename,
                MAX_FILE_SIZE / 1024 / 1024
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(IncomingFile {
        filename,
        content_type,
        data,
    })
}

/// Keep only the final path component of a client-supplied filename
fn sanitize_filename(raw: Option<&str>) -> String {
    let name = raw
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        "unnamed".to_string()
    } else {
        name.to_string()
    }
}

/// List files uploaded by the current user
#[utoipa::path(
    get,
    path = "/api/v1/file/my-uploads",
    tag = "files",
    responses(
        (status = 200, description = "Files owned by the caller, newest first", body = ApiResponse<Vec<FileSummaryDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_my_uploads(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<Vec<FileSummaryDto>>>> {
    let files = service.list_my_uploads(user.user_id).await?;
    let total = files.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Get a time-limited download URL for a file
#[utoipa::path(
    get,
    path = "/api/v1/file/{file_id}/download",
    tag = "files",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Download URL issued", body = ApiResponse<DownloadResponseDto>),
        (status = 400, description = "Invalid file ID"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "No active permission on the file"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_file(
    user: AuthenticatedUser,
    AppPath(file_id): AppPath<Uuid>,
    State(service): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<DownloadResponseDto>>> {
    let download = service.download(user.user_id, file_id).await?;
    Ok(Json(ApiResponse::success(Some(download), None, None)))
}
