//! Data Transfer Objects for the AgriChain API

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use agrichain_core::ledger::{OrderItemRequest, SplitRequest};
use agrichain_core::trace::TraceStory;
use agrichain_core::types::{GeoPoint, Role, User};

use crate::error::ApiError;
use crate::mirror::MirrorTransaction;

/// Run validator-derived checks, mapping failures onto the envelope
pub fn validate(request: &impl Validate) -> Result<(), ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ---- auth ----

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// One of FARMER, DISTRIBUTOR, TRANSPORTER, SHOPKEEPER, CONSUMER
    pub role: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// User shape safe to serialize out (no password hash)
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub wallet_balance: Decimal,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            role: user.role,
            wallet_balance: user.wallet_balance,
        }
    }
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

// ---- farmer ----

/// Create product request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 4096))]
    pub crop_details: Option<String>,
}

/// Create batch (harvest) request
#[derive(Debug, Deserialize)]
pub struct CreateBatchRequest {
    pub product_id: Uuid,
    pub initial_quantity: Decimal,
    pub quantity_unit: String,
    pub price_per_unit: Option<Decimal>,
    pub harvest_date: Option<NaiveDate>,
}

/// Direct event-log request
#[derive(Debug, Deserialize)]
pub struct LogEventRequest {
    pub batch_id: Uuid,
    /// Taxonomy name, e.g. "Irrigation" or "Transport Start"
    pub event_type: String,
    pub location: Option<GeoPoint>,
    pub note: Option<String>,
}

// ---- distributor ----

/// Whole-batch purchase request
#[derive(Debug, Deserialize)]
pub struct BuyBatchRequest {
    pub batch_id: Uuid,
}

/// Split request
#[derive(Debug, Deserialize)]
pub struct SplitBatchRequest {
    pub batch_id: Uuid,
    pub splits: Vec<SplitRequest>,
}

// ---- logistics ----

/// Ship/deliver request
#[derive(Debug, Deserialize)]
pub struct BatchActionRequest {
    pub batch_id: Uuid,
}

/// Retail sale request
#[derive(Debug, Deserialize)]
pub struct SellRequest {
    pub batch_id: Uuid,
    pub final_price: Decimal,
}

/// Attachment upload metadata
#[derive(Debug, Deserialize, Validate)]
pub struct AddAttachmentRequest {
    #[validate(length(min = 1, max = 256))]
    pub file_name: String,
    #[validate(length(max = 2048))]
    pub file_url: Option<String>,
    #[validate(length(max = 256))]
    pub content_type: Option<String>,
}

/// Device reading upload
#[derive(Debug, Deserialize, Validate)]
pub struct AddDeviceDataRequest {
    #[validate(length(min = 1, max = 256))]
    pub device_id: String,
    pub payload: Value,
}

// ---- commerce ----

/// Create order request
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

// ---- traceability ----

/// Full trace response: the assembled story plus the external ledger
/// mirror's transaction list
#[derive(Debug, Serialize)]
pub struct TraceResponse {
    #[serde(flatten)]
    pub story: TraceStory,
    pub ledger_transactions: Vec<MirrorTransaction>,
}
