//! API error types and the response envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use agrichain_core::CoreError;
use agrichain_store::StoreError;

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request
    #[error("{0}")]
    BadRequest(String),

    /// Unauthorized
    #[error("{0}")]
    Unauthorized(String),

    /// Forbidden
    #[error("{0}")]
    Forbidden(String),

    /// Not found
    #[error("{0}")]
    NotFound(String),

    /// Conflict
    #[error("{0}")]
    Conflict(String),

    /// Internal server error
    #[error("{0}")]
    Internal(String),
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::Validation(_) => ApiError::BadRequest(err.to_string()),
            CoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            CoreError::Forbidden(_) => ApiError::Forbidden(err.to_string()),
            CoreError::Conflict(_) => ApiError::Conflict(err.to_string()),
            // State preconditions report both the limiting and requested values
            CoreError::InsufficientQuantity { .. }
            | CoreError::InsufficientFunds { .. }
            | CoreError::InvalidStatus { .. } => ApiError::BadRequest(err.to_string()),
            CoreError::Config(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(core) => core.into(),
            StoreError::Database(msg) => {
                tracing::error!(error = %msg, "database failure");
                ApiError::Internal("Internal server error".into())
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let body = ErrorBody {
            success: false,
            message: self.to_string(),
            error: code,
        };
        (status, Json(body)).into_response()
    }
}

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response with payload
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
            count: None,
        })
    }

    /// Successful response without payload
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: None,
            count: None,
        })
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Successful list response with a count field
    pub fn list(message: impl Into<String>, data: Vec<T>) -> Json<Self> {
        let count = data.len();
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
            count: Some(count),
        })
    }
}
