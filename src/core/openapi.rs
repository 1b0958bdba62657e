use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::list_users,
        // Files
        files_handlers::upload_files,
        files_handlers::list_my_uploads,
        files_handlers::download_file,
        // Sharing
        files_handlers::share_with_users,
        files_handlers::list_shared_with_me,
        files_handlers::create_share_link,
        files_handlers::redeem_share_link,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::UserResponseDto,
            auth::dtos::AuthUserDto,
            auth::dtos::LoginResponseDto,
            auth::dtos::UserListDto,
            ApiResponse<auth::dtos::UserResponseDto>,
            ApiResponse<auth::dtos::LoginResponseDto>,
            ApiResponse<auth::dtos::UserListDto>,
            // Files
            files_dtos::UploadFilesDto,
            files_dtos::FileSummaryDto,
            files_dtos::DownloadResponseDto,
            ApiResponse<Vec<files_dtos::FileSummaryDto>>,
            ApiResponse<files_dtos::DownloadResponseDto>,
            // Sharing
            files_dtos::ShareWithUsersDto,
            files_dtos::ShareWithUsersResponseDto,
            files_dtos::CreateShareLinkDto,
            files_dtos::ShareLinkResponseDto,
            files_dtos::FileOwnerDto,
            files_dtos::SharedFileDto,
            ApiResponse<files_dtos::ShareWithUsersResponseDto>,
            ApiResponse<files_dtos::ShareLinkResponseDto>,
            ApiResponse<files_dtos::SharedFileDto>,
            ApiResponse<Vec<files_dtos::SharedFileDto>>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and the user directory"),
        (name = "files", description = "File upload, listing and download"),
        (name = "sharing", description = "Per-user grants and share links"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Fileshare API",
        version = "0.1.0",
        description = "API documentation for the file storage and sharing service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
