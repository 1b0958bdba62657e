use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    normalize_email, LoginRequestDto, LoginResponseDto, RegisterRequestDto, UserListDto,
    UserResponseDto,
};
use crate::features::auth::services::AuthService;
use crate::shared::types::{ApiResponse, PaginationQuery};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn register(
    State(service): State<Arc<AuthService>>,
    AppJson(mut dto): AppJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    dto.name = dto.name.trim().to_string();
    dto.email = normalize_email(&dto.email);
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.register(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(user),
            Some("User registered successfully".to_string()),
            None,
        )),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    AppJson(mut dto): AppJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<LoginResponseDto>>> {
    dto.email = normalize_email(&dto.email);
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = service.login(dto).await?;
    Ok(Json(ApiResponse::success(
        Some(response),
        Some("Login successful".to_string()),
        None,
    )))
}

/// List registered users (paginated, newest first)
#[utoipa::path(
    get,
    path = "/api/v1/auth/users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of users", body = ApiResponse<UserListDto>),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn list_users(
    State(service): State<Arc<AuthService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<UserListDto>>> {
    let page = service.list_users(&params).await?;
    Ok(Json(ApiResponse::success(Some(page), None, None)))
}
