//! Logistics handlers: transporter jobs and events, shop inventory and
//! retail sale

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use agrichain_core::types::{Batch, BatchStatus, DeviceReading, Event, EventAttachment, EventKind};
use agrichain_store::{NewAttachment, NewDeviceReading, RecordEventRequest};

use crate::dto::{
    validate, AddAttachmentRequest, AddDeviceDataRequest, BatchActionRequest, LogEventRequest,
    SellRequest,
};
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::middleware::AuthClaims;
use crate::state::AppState;

// ---- transporter ----

/// `GET /api/transporter/jobs` - batches currently on the road
pub async fn transport_jobs(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<Batch>>>> {
    let batches = state
        .store
        .list_batches_by_status(BatchStatus::InTransit)
        .await?;
    Ok(ApiResponse::list("Jobs retrieved successfully", batches))
}

/// `POST /api/transporter/deliver` - In Transit -> In Shop
pub async fn deliver(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<BatchActionRequest>,
) -> ApiResult<Json<ApiResponse<Batch>>> {
    let actor = claims.user_id()?;
    let batch = state
        .store
        .deliver_batch(actor, claims.role, request.batch_id)
        .await?;
    Ok(ApiResponse::ok(
        "Batch delivered successfully; status set to In Shop",
        batch,
    ))
}

/// `POST /api/transporter/events` - log a transport event with optional
/// geolocation
pub async fn log_transport_event(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<LogEventRequest>,
) -> ApiResult<Json<ApiResponse<Event>>> {
    let actor = claims.user_id()?;
    let kind = EventKind::parse(&request.event_type).ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown event_type '{}'", request.event_type))
    })?;
    let event = state
        .store
        .record_event(RecordEventRequest {
            actor,
            actor_role: claims.role,
            batch_id: request.batch_id,
            kind,
            location: request.location,
            note: request.note,
        })
        .await?;
    Ok(ApiResponse::ok("Event logged successfully", event))
}

/// `POST /api/transporter/events/:event_id/attachments` - proof of
/// condition
pub async fn add_attachment(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<AddAttachmentRequest>,
) -> ApiResult<Json<ApiResponse<EventAttachment>>> {
    validate(&request)?;
    let actor = claims.user_id()?;
    let attachment = state
        .store
        .add_attachment(
            actor,
            event_id,
            NewAttachment {
                file_name: request.file_name,
                file_url: request.file_url,
                content_type: request.content_type,
            },
        )
        .await?;
    Ok(ApiResponse::ok("Attachment added successfully", attachment))
}

/// `POST /api/transporter/events/:event_id/device-data` - IoT readings
pub async fn add_device_data(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<AddDeviceDataRequest>,
) -> ApiResult<Json<ApiResponse<DeviceReading>>> {
    validate(&request)?;
    let actor = claims.user_id()?;
    let reading = state
        .store
        .add_device_reading(
            actor,
            event_id,
            NewDeviceReading {
                device_id: request.device_id,
                payload: request.payload,
            },
        )
        .await?;
    Ok(ApiResponse::ok("Device data added successfully", reading))
}

// ---- shop ----

/// `GET /api/shop/inventory` - batches sitting in the shop
pub async fn shop_inventory(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<Batch>>>> {
    let batches = state
        .store
        .list_batches_by_status(BatchStatus::InShop)
        .await?;
    Ok(ApiResponse::list(
        "Inventory retrieved successfully",
        batches,
    ))
}

/// `POST /api/shop/sell` - retail sale to a walk-in consumer
pub async fn sell_to_consumer(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<SellRequest>,
) -> ApiResult<Json<ApiResponse<Batch>>> {
    let actor = claims.user_id()?;
    let batch = state
        .store
        .sell_to_consumer(actor, claims.role, request.batch_id, request.final_price)
        .await?;
    Ok(ApiResponse::ok("Batch sold successfully", batch))
}
