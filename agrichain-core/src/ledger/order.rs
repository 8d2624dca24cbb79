//! Order planning
//!
//! All-or-nothing commerce: every referenced batch is locked up front,
//! every line item validated against the running remaining quantity, and
//! either the whole plan applies or none of it does.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Batch, BatchStatus};

/// One requested line item
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRequest {
    pub batch_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// One validated line item with its post-deduction batch state
#[derive(Debug, Clone)]
pub struct PlannedOrderItem {
    pub batch_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub remaining_after: Decimal,
    /// Set when this item drains the batch
    pub status_after: Option<BatchStatus>,
}

/// Validated order plan
#[derive(Debug, Clone)]
pub struct OrderPlan {
    pub seller_id: Uuid,
    pub total_amount: Decimal,
    pub items: Vec<PlannedOrderItem>,
}

/// Validate an order against the locked batch snapshots.
///
/// Items are processed in request order against a running per-batch
/// remaining quantity, so two items against the same batch cannot
/// jointly over-drain it. Orders spanning batches with different owners
/// are rejected outright rather than mis-attributing proceeds.
pub fn plan_order(
    buyer: Uuid,
    items: &[OrderItemRequest],
    batches: &HashMap<Uuid, Batch>,
) -> CoreResult<OrderPlan> {
    if items.is_empty() {
        return Err(CoreError::validation(
            "items array is required and must not be empty",
        ));
    }

    let mut seller: Option<(Uuid, Uuid)> = None; // (seller_id, first batch_id)
    let mut remaining: HashMap<Uuid, Decimal> = HashMap::new();
    let mut planned = Vec::with_capacity(items.len());
    let mut total_amount = Decimal::ZERO;

    for item in items {
        let batch = batches
            .get(&item.batch_id)
            .ok_or_else(|| CoreError::not_found(format!("Batch {} not found", item.batch_id)))?;

        if item.quantity <= Decimal::ZERO {
            return Err(CoreError::validation(format!(
                "Invalid quantity for batch {}",
                batch.batch_code
            )));
        }
        if item.unit_price <= Decimal::ZERO {
            return Err(CoreError::validation(format!(
                "Invalid unit_price for batch {}",
                batch.batch_code
            )));
        }

        match seller {
            None => seller = Some((batch.current_owner_id, batch.id)),
            Some((seller_id, first_batch)) if seller_id != batch.current_owner_id => {
                return Err(CoreError::validation(format!(
                    "Order spans multiple sellers: batches {} and {} have different owners",
                    first_batch, batch.id
                )));
            }
            Some(_) => {}
        }

        let available = remaining
            .entry(batch.id)
            .or_insert(batch.remaining_quantity);
        if item.quantity > *available {
            return Err(CoreError::InsufficientQuantity {
                batch_code: batch.batch_code.clone(),
                available: *available,
                requested: item.quantity,
            });
        }
        *available -= item.quantity;
        let remaining_after = *available;

        let line_total = item.quantity * item.unit_price;
        total_amount += line_total;
        planned.push(PlannedOrderItem {
            batch_id: batch.id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total,
            remaining_after,
            status_after: (remaining_after == Decimal::ZERO).then_some(BatchStatus::Sold),
        });
    }

    let (seller_id, _) = seller.expect("non-empty items always set a seller");
    if seller_id == buyer {
        return Err(CoreError::validation(
            "Cannot order batches you already own",
        ));
    }

    Ok(OrderPlan {
        seller_id,
        total_amount,
        items: planned,
    })
}
