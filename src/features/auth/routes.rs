use crate::features::auth::handlers;
use crate::features::auth::services::AuthService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Public auth routes (no authentication required)
pub fn public_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(handlers::register))
        .route("/api/v1/auth/login", post(handlers::login))
        // Unauthenticated, matching the current public contract of the endpoint.
        .route("/api/v1/auth/users", get(handlers::list_users))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use crate::features::auth::JwtService;
    use crate::shared::test_helpers::lazy_pool;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use serde_json::json;
    use std::time::Duration;

    fn server() -> TestServer {
        let jwt = Arc::new(JwtService::new(&AuthConfig {
            jwt_secret: Some("test_secret_key_for_testing_only".to_string()),
            token_ttl: Duration::from_secs(3600),
        }));
        let service = Arc::new(AuthService::new(lazy_pool(), jwt));
        TestServer::new(public_routes(service)).unwrap()
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let server = server();
        let name: String = Name().fake();
        let email: String = SafeEmail().fake();

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({ "name": name, "email": email, "password": "short" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["source"], "ValidationError");
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_register_rejects_blank_name() {
        let server = server();
        let email: String = SafeEmail().fake();

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({ "name": "   ", "email": email, "password": "password123" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["source"], "ValidationError");
    }

    #[tokio::test]
    async fn test_register_rejects_missing_fields() {
        let server = server();

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({ "email": "someone@example.com" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let server = server();

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "someone@example.com" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let server = server();

        let response = server
            .post("/api/v1/auth/login")
            .content_type("application/json")
            .bytes("{not json".into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
