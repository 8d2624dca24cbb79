//! Role gates
//!
//! Role-gated routers additionally require the caller's role to match
//! the route's required role. Runs after `auth_middleware`, which put the
//! claims into the request extensions.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use agrichain_core::types::Role;

use crate::error::ApiError;
use crate::middleware::AuthClaims;

async fn gate(required: Role, request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthClaims>() {
        Some(claims) if claims.role == required => next.run(request).await,
        Some(claims) => ApiError::Forbidden(format!(
            "This endpoint requires the {required} role, you are {}",
            claims.role
        ))
        .into_response(),
        None => ApiError::Unauthorized("Authentication required".into()).into_response(),
    }
}

pub async fn require_farmer(request: Request, next: Next) -> Response {
    gate(Role::Farmer, request, next).await
}

pub async fn require_distributor(request: Request, next: Next) -> Response {
    gate(Role::Distributor, request, next).await
}

pub async fn require_transporter(request: Request, next: Next) -> Response {
    gate(Role::Transporter, request, next).await
}

pub async fn require_shopkeeper(request: Request, next: Next) -> Response {
    gate(Role::Shopkeeper, request, next).await
}
