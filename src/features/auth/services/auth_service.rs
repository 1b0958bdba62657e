use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    AuthUserDto, LoginRequestDto, LoginResponseDto, RegisterRequestDto, UserListDto,
    UserResponseDto,
};
use crate::features::auth::jwt::JwtService;
use crate::features::auth::model::{User, UserSummary};
use crate::features::auth::password;
use crate::shared::types::PaginationQuery;

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// Service for registration, login and the user directory
pub struct AuthService {
    pool: PgPool,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtService>) -> Self {
        Self { pool, jwt }
    }

    /// Register a new user. Expects a validated DTO with a trimmed name and
    /// a normalized email.
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<UserResponseDto> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&dto.email)
                .fetch_one(&self.pool)
                .await?;

        if exists {
            return Err(AppError::Conflict(
                "User already exists with this email".to_string(),
            ));
        }

        let password_hash = password::hash_blocking(dto.password).await?;

        // A concurrent registration can still win the race; the unique index decides.
        let user: UserSummary = sqlx::query_as(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, EMAIL_UNIQUE_CONSTRAINT) {
                AppError::Conflict("User already exists with this email".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        info!("User registered: id={}", user.id);

        Ok(user.into())
    }

    /// Authenticate and issue a session token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, dto: LoginRequestDto) -> Result<LoginResponseDto> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(&dto.email)
        .fetch_optional(&self.pool)
        .await?;

        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let password_valid = password::verify_blocking(dto.password, stored_hash).await?;

        let user = match user {
            Some(user) if password_valid => user,
            _ => {
                debug!("Login rejected");
                return Err(AppError::Unauthorized("Invalid credentials".to_string()));
            }
        };

        let token = self.jwt.sign(user.id, &user.email)?;

        info!("User logged in: id={}", user.id);

        Ok(LoginResponseDto {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.ttl_secs(),
            user: AuthUserDto::from(&user),
        })
    }

    /// List users, most recently registered first
    pub async fn list_users(&self, params: &PaginationQuery) -> Result<UserListDto> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let users: Vec<UserSummary> = sqlx::query_as(
            r#"
            SELECT id, name, email, created_at
            FROM users
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(UserListDto {
            page: params.page(),
            limit: params.limit(),
            total,
            users: users.into_iter().map(UserResponseDto::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use std::time::Duration;

    fn service(pool: PgPool) -> AuthService {
        let jwt = Arc::new(JwtService::new(&AuthConfig {
            jwt_secret: Some("test_secret_key_for_testing_only".to_string()),
            token_ttl: Duration::from_secs(3600),
        }));
        AuthService::new(pool, jwt)
    }

    fn register_dto(email: &str) -> RegisterRequestDto {
        RegisterRequestDto {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_register_stores_hash_not_plaintext(pool: PgPool) {
        let service = service(pool.clone());
        let user = service
            .register(register_dto("alice@example.com"))
            .await
            .unwrap();

        let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_ne!(stored, "password123");
        assert!(!stored.contains("password123"));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_duplicate_email_conflicts(pool: PgPool) {
        let service = service(pool);
        service
            .register(register_dto("bob@example.com"))
            .await
            .unwrap();

        let err = service
            .register(register_dto("bob@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_login_is_uniform_for_unknown_email_and_wrong_password(pool: PgPool) {
        let service = service(pool);
        service
            .register(register_dto("carol@example.com"))
            .await
            .unwrap();

        let ok = service
            .login(LoginRequestDto {
                email: "carol@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();
        assert!(!ok.token.is_empty());

        let wrong_password = service
            .login(LoginRequestDto {
                email: "carol@example.com".to_string(),
                password: "password124".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginRequestDto {
                email: "nobody@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_list_users_clamps_limit(pool: PgPool) {
        let service = service(pool);
        for i in 0..3 {
            service
                .register(register_dto(&format!("user{}@example.com", i)))
                .await
                .unwrap();
        }

        let page = service
            .list_users(&PaginationQuery { page: 0, limit: 500 })
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);
        assert_eq!(page.total, 3);
        assert_eq!(page.users.len(), 3);
        assert_eq!(page.users[0].email, "user2@example.com");
    }
}
