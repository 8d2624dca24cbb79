//! Farmer handlers: products, harvest batches and field events

use axum::{extract::State, http::StatusCode, Extension, Json};

use agrichain_core::ledger::HarvestRequest;
use agrichain_core::types::{Batch, EventKind, Product};
use agrichain_store::RecordEventRequest;

use crate::dto::{validate, CreateBatchRequest, CreateProductRequest, LogEventRequest};
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::middleware::AuthClaims;
use crate::state::AppState;

/// `POST /api/farmer/products`
pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Product>>)> {
    validate(&request)?;
    let farmer_id = claims.user_id()?;
    let product = state
        .store
        .create_product(farmer_id, request.title, request.crop_details)
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Product created successfully", product),
    ))
}

/// `GET /api/farmer/products`
pub async fn list_products(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> ApiResult<Json<ApiResponse<Vec<Product>>>> {
    let farmer_id = claims.user_id()?;
    let products = state.store.list_products_by_farmer(farmer_id).await?;
    Ok(ApiResponse::list("Products retrieved successfully", products))
}

/// `POST /api/farmer/batches`
///
/// Creates a root harvest batch: batch + Harvest event + chain-log row in
/// one transaction.
pub async fn create_batch(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<CreateBatchRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Batch>>)> {
    let farmer_id = claims.user_id()?;
    let batch = state
        .store
        .create_batch(HarvestRequest {
            actor: farmer_id,
            product_id: request.product_id,
            initial_quantity: request.initial_quantity,
            quantity_unit: request.quantity_unit,
            price_per_unit: request.price_per_unit,
            harvest_date: request.harvest_date,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Batch created successfully", batch),
    ))
}

/// `GET /api/farmer/batches`
pub async fn my_batches(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> ApiResult<Json<ApiResponse<Vec<Batch>>>> {
    let farmer_id = claims.user_id()?;
    let batches = state.store.list_batches_by_owner(farmer_id).await?;
    Ok(ApiResponse::list("Batches retrieved successfully", batches))
}

/// `POST /api/farmer/events`
///
/// Logs a field event (fertilizer, pesticide, irrigation, quality check,
/// harvest log) against an owned batch.
pub async fn log_event(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<LogEventRequest>,
) -> ApiResult<Json<ApiResponse<agrichain_core::types::Event>>> {
    let farmer_id = claims.user_id()?;
    let kind = EventKind::parse(&request.event_type).ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown event_type '{}'", request.event_type))
    })?;
    let event = state
        .store
        .record_event(RecordEventRequest {
            actor: farmer_id,
            actor_role: claims.role,
            batch_id: request.batch_id,
            kind,
            location: request.location,
            note: request.note,
        })
        .await?;
    Ok(ApiResponse::ok("Event logged successfully", event))
}
