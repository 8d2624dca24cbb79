//! Traceability handlers
//!
//! Public endpoints: a consumer scanning a QR code is not authenticated.
//! All of them are read-only fan-out reads; the external ledger mirror is
//! merged in as best-effort enrichment and can never fail a trace.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use agrichain_core::trace::{assemble_story, Genealogy, TimelineEntry};
use agrichain_core::types::Batch;

use crate::dto::TraceResponse;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::mirror::MirrorTransaction;
use crate::state::AppState;

async fn resolve_batch(state: &AppState, batch_code: &str) -> ApiResult<Batch> {
    state
        .store
        .find_batch_by_code(batch_code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Batch not found".into()))
}

async fn mirror_transactions(state: &AppState, product_id: Uuid) -> Vec<MirrorTransaction> {
    match &state.mirror {
        Some(mirror) => mirror.product_transactions_or_empty(product_id).await,
        None => Vec::new(),
    }
}

/// `GET /api/traceability/batch/:batch_code`
///
/// The full story: batch summary, genealogy tree, chronological timeline,
/// role-grouped stages, journey summary and mirrored ledger transactions.
pub async fn trace_batch(
    State(state): State<AppState>,
    Path(batch_code): Path<String>,
) -> ApiResult<Json<ApiResponse<TraceResponse>>> {
    let batch = resolve_batch(&state, &batch_code).await?;
    let product = state.store.get_product(batch.product_id).await?;
    let bundle = state.store.lineage_bundle(batch.product_id).await?;
    let story = assemble_story(product, &bundle, batch.id)?;
    let ledger_transactions = mirror_transactions(&state, batch.product_id).await;

    Ok(ApiResponse::ok(
        "Traceability data retrieved successfully",
        TraceResponse {
            story,
            ledger_transactions,
        },
    ))
}

/// `GET /api/traceability/batch/:batch_code/genealogy`
pub async fn genealogy(
    State(state): State<AppState>,
    Path(batch_code): Path<String>,
) -> ApiResult<Json<ApiResponse<Genealogy>>> {
    let batch = resolve_batch(&state, &batch_code).await?;
    let bundle = state.store.lineage_bundle(batch.product_id).await?;
    let genealogy = agrichain_core::trace::build_genealogy(&bundle.batches, batch.id)?;
    Ok(ApiResponse::ok(
        "Genealogy tree retrieved successfully",
        genealogy,
    ))
}

/// `GET /api/traceability/batch/:batch_code/events`
pub async fn batch_events(
    State(state): State<AppState>,
    Path(batch_code): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<TimelineEntry>>>> {
    let batch = resolve_batch(&state, &batch_code).await?;
    let bundle = state.store.lineage_bundle(batch.product_id).await?;
    let timeline = agrichain_core::trace::build_timeline(&bundle);
    Ok(ApiResponse::list("Events retrieved successfully", timeline))
}

/// `GET /api/traceability/product/:product_id/blockchain`
pub async fn product_blockchain(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<MirrorTransaction>>>> {
    if state.store.get_product(product_id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".into()));
    }
    let transactions = mirror_transactions(&state, product_id).await;
    Ok(ApiResponse::list(
        "Ledger transactions retrieved successfully",
        transactions,
    ))
}
