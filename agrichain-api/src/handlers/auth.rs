//! Auth handlers: registration and login
//!
//! Passwords are hashed with argon2; successful logins issue an HS256
//! bearer token carrying user id, username and role.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{extract::State, http::StatusCode, Json};

use agrichain_core::types::Role;
use agrichain_store::NewUser;

use crate::dto::{validate, LoginRequest, LoginResponse, PublicUser, RegisterRequest};
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::middleware::issue_token;
use crate::state::AppState;

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PublicUser>>)> {
    validate(&request)?;
    let role = Role::parse(&request.role)
        .ok_or_else(|| ApiError::BadRequest("Invalid role supplied".into()))?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .store
        .create_user(NewUser {
            username: request.username,
            password_hash,
            role,
        })
        .await?;

    tracing::info!(username = %user.username, role = %user.role, "account created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Account created successfully", PublicUser::from(&user)),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    validate(&request)?;

    let user = state
        .store
        .find_user_by_username(&request.username)
        .await?
        .filter(|user| verify_password(&request.password, &user.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".into()))?;

    let token = issue_token(&state.jwt, &user)?;
    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            token,
            user: PublicUser::from(&user),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("password123").unwrap();
        assert!(verify_password("password123", &hash));
        assert!(!verify_password("password124", &hash));
        assert!(!verify_password("password123", "not-a-phc-string"));
    }
}
