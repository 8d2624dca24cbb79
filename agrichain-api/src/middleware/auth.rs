//! JWT Authentication Middleware
//!
//! Validates bearer tokens and attaches claims to authenticated requests.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agrichain_core::types::{Role, User};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HS256
    secret: String,
    /// Token lifetime in hours
    pub expiry_hours: i64,
}

impl JwtConfig {
    /// Minimum secret length for security
    const MIN_SECRET_LENGTH: usize = 32;

    /// Default token lifetime
    const DEFAULT_EXPIRY_HOURS: i64 = 24;

    /// Create a new JWT config with secret.
    ///
    /// Fails when the secret is shorter than 32 bytes.
    pub fn try_new(secret: impl Into<String>) -> Result<Self, ApiError> {
        let secret = secret.into();
        if secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(ApiError::Internal(format!(
                "JWT secret must be at least {} bytes for security. Got {} bytes. \
                Use a cryptographically secure random secret.",
                Self::MIN_SECRET_LENGTH,
                secret.len()
            )));
        }
        Ok(Self {
            secret,
            expiry_hours: Self::DEFAULT_EXPIRY_HOURS,
        })
    }

    /// Create a new JWT config from an environment variable.
    pub fn try_from_env(env_var: &str) -> Result<Self, ApiError> {
        let secret = std::env::var(env_var).map_err(|_| {
            ApiError::Internal(format!(
                "JWT secret environment variable '{env_var}' is not set. \
                Set it to a cryptographically secure random value (at least 32 bytes)."
            ))
        })?;
        Self::try_new(secret)
    }

    /// Test config with a fixed secret
    pub fn for_testing() -> Self {
        Self {
            secret: "agrichain-test-secret-0123456789abcdef".into(),
            expiry_hours: Self::DEFAULT_EXPIRY_HOURS,
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Subject: user id
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AuthClaims {
    /// Parse the subject back into a user id
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))
    }
}

/// Sign a bearer token for an authenticated user.
pub fn issue_token(config: &JwtConfig, user: &User) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = AuthClaims {
        sub: user.user_id.to_string(),
        username: user.username.clone(),
        role: user.role,
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(config.expiry_hours)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
}

fn authenticate(config: &JwtConfig, request: &Request) -> Result<AuthClaims, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Authorization header is required".into()))?;
    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized("Invalid authorization header format. Expected: Bearer <token>".into())
    })?;

    let decoded = decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            ApiError::Unauthorized("Token has expired".into())
        }
        _ => ApiError::Unauthorized("Invalid token".into()),
    })?;
    Ok(decoded.claims)
}

/// Bearer-token middleware: rejects unauthenticated requests and attaches
/// [`AuthClaims`] as a request extension for handlers and role gates.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state.jwt, &request) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn user(role: Role) -> User {
        User {
            user_id: Uuid::new_v4(),
            username: "farmer_joe".into(),
            password_hash: "hash".into(),
            role,
            wallet_balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(JwtConfig::try_new("short").is_err());
        assert!(JwtConfig::try_new("x".repeat(32)).is_ok());
    }

    #[test]
    fn issued_token_round_trips() {
        let config = JwtConfig::for_testing();
        let user = user(Role::Farmer);
        let token = issue_token(&config, &user).unwrap();

        let decoded = decode::<AuthClaims>(
            &token,
            &DecodingKey::from_secret(config.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, user.user_id.to_string());
        assert_eq!(decoded.claims.role, Role::Farmer);
        assert_eq!(decoded.claims.user_id().unwrap(), user.user_id);
    }
}
