//! Distributor handlers: marketplace, purchase, split, inventory, ship

use axum::{extract::State, http::StatusCode, Extension, Json};

use agrichain_core::types::Batch;
use agrichain_store::{MarketListing, PurchaseOutcome, SplitOutcome};

use crate::dto::{BatchActionRequest, BuyBatchRequest, SplitBatchRequest};
use crate::error::{ApiResponse, ApiResult};
use crate::middleware::AuthClaims;
use crate::state::AppState;

/// `GET /api/distributor/marketplace`
///
/// Purchasable batches (Harvested, quantity left) with farmer context.
pub async fn marketplace(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<MarketListing>>>> {
    let listings = state.store.list_marketplace().await?;
    Ok(ApiResponse::list(
        "Marketplace retrieved successfully",
        listings,
    ))
}

/// `POST /api/distributor/buy`
///
/// Whole-batch ownership transfer with wallet settlement.
pub async fn buy(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<BuyBatchRequest>,
) -> ApiResult<Json<ApiResponse<PurchaseOutcome>>> {
    let buyer = claims.user_id()?;
    let outcome = state.store.buy_batch(buyer, request.batch_id).await?;
    Ok(ApiResponse::ok("Purchase successful", outcome))
}

/// `POST /api/distributor/split-batch`
pub async fn split_batch(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<SplitBatchRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SplitOutcome>>)> {
    let actor = claims.user_id()?;
    let outcome = state
        .store
        .split_batch(actor, request.batch_id, request.splits)
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Batch split successfully", outcome),
    ))
}

/// `GET /api/distributor/inventory`
pub async fn inventory(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> ApiResult<Json<ApiResponse<Vec<Batch>>>> {
    let owner = claims.user_id()?;
    let batches = state.store.list_batches_by_owner(owner).await?;
    Ok(ApiResponse::list(
        "Inventory retrieved successfully",
        batches,
    ))
}

/// `POST /api/distributor/ship`
pub async fn ship(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<BatchActionRequest>,
) -> ApiResult<Json<ApiResponse<Batch>>> {
    let actor = claims.user_id()?;
    let batch = state
        .store
        .ship_batch(actor, claims.role, request.batch_id)
        .await?;
    Ok(ApiResponse::ok(
        "Batch shipped successfully; status set to In Transit",
        batch,
    ))
}
