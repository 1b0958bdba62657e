//! Session token issuance and validation (HS256, shared secret).

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use uuid::Uuid;

use super::model::{AuthenticatedUser, SessionClaims};
use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

pub struct JwtService {
    keys: Option<SigningKeys>,
    ttl_secs: i64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        let keys = config.jwt_secret.as_ref().map(|secret| SigningKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        });

        Self {
            keys,
            ttl_secs: config.token_ttl.as_secs() as i64,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    /// Token lifetime in seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    fn keys(&self) -> Result<&SigningKeys> {
        self.keys.as_ref().ok_or_else(|| {
            tracing::error!("FATAL: JWT_SECRET is not configured");
            AppError::Internal("JWT signing secret is not configured".to_string())
        })
    }

    /// Issue a signed session token for the given user
    pub fn sign(&self, user_id: Uuid, email: &str) -> Result<String> {
        let keys = self.keys()?;
        let now = Utc::now().timestamp();

        let claims = SessionClaims {
            user_id,
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }

    /// Validate a session token and extract the caller identity
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser> {
        let keys = self.keys()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &keys.decoding, &validation).map_err(|e| {
            match e.kind() {
                JwtErrorKind::ExpiredSignature => tracing::debug!("Expired session token"),
                _ => tracing::debug!("Rejected session token: {}", e),
            }
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(AuthenticatedUser {
            user_id: data.claims.user_id,
            email: data.claims.email,
        })
    }
}
