//! Commerce handlers: order creation and lookup

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use agrichain_core::types::OrderWithItems;

use crate::dto::CreateOrderRequest;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::middleware::AuthClaims;
use crate::state::AppState;

/// `POST /api/commerce/orders`
///
/// All-or-nothing: every referenced batch is locked, every line item
/// validated; on any failure no batch quantity moves and no order row
/// persists.
pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let buyer = claims.user_id()?;
    let order = state.store.create_order(buyer, request.items).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Order created successfully", order),
    ))
}

/// `GET /api/commerce/orders`
///
/// Orders where the caller is the buyer or the seller.
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> ApiResult<Json<ApiResponse<Vec<OrderWithItems>>>> {
    let user_id = claims.user_id()?;
    let orders = state.store.list_orders_for_user(user_id).await?;
    Ok(ApiResponse::list("Orders retrieved successfully", orders))
}

/// `GET /api/commerce/orders/:order_id`
pub async fn order_by_id(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<OrderWithItems>>> {
    let user_id = claims.user_id()?;
    let order = state
        .store
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    if order.order.buyer_id != user_id && order.order.seller_id != user_id {
        return Err(ApiError::Forbidden(
            "You do not have access to this order".into(),
        ));
    }
    Ok(ApiResponse::ok("Order retrieved successfully", order))
}
