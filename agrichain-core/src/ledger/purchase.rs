//! Whole-batch purchase planning
//!
//! The marketplace buy path transfers ownership of the entire batch;
//! partial quantities go through splits or the order path instead.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Batch, BatchStatus};

/// Fallback price when a batch was listed without one
pub const DEFAULT_PRICE_PER_UNIT: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Validated purchase: ownership transfer + wallet settlement
#[derive(Debug, Clone)]
pub struct PurchasePlan {
    pub seller_id: Uuid,
    /// price per unit x remaining quantity
    pub cost: Decimal,
    pub status_after: BatchStatus,
}

/// Validate a whole-batch purchase against the locked batch snapshot and
/// the buyer's locked wallet balance.
pub fn plan_purchase(batch: &Batch, buyer: Uuid, buyer_balance: Decimal) -> CoreResult<PurchasePlan> {
    if !batch.status.purchasable() {
        return Err(CoreError::InvalidStatus {
            batch_code: batch.batch_code.clone(),
            actual: batch.status,
            expected: BatchStatus::Harvested.as_str().to_string(),
        });
    }
    if batch.remaining_quantity <= Decimal::ZERO {
        return Err(CoreError::InsufficientQuantity {
            batch_code: batch.batch_code.clone(),
            available: batch.remaining_quantity,
            requested: batch.remaining_quantity,
        });
    }
    if batch.current_owner_id == buyer {
        return Err(CoreError::validation("You already own this batch"));
    }

    let unit_price = batch.price_per_unit.unwrap_or(DEFAULT_PRICE_PER_UNIT);
    let cost = unit_price * batch.remaining_quantity;
    if buyer_balance < cost {
        return Err(CoreError::InsufficientFunds {
            needed: cost,
            available: buyer_balance,
        });
    }

    Ok(PurchasePlan {
        seller_id: batch.current_owner_id,
        cost,
        // Leaves the marketplace and satisfies the ship-ready precondition
        status_after: BatchStatus::InWarehouse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listed_batch(owner: Uuid, remaining: i64, price: Option<i64>) -> Batch {
        Batch {
            id: Uuid::new_v4(),
            batch_code: "AGB-TEST-LISTED".into(),
            product_id: Uuid::new_v4(),
            parent_batch_id: None,
            current_owner_id: owner,
            status: BatchStatus::Harvested,
            initial_quantity: Decimal::from(100),
            remaining_quantity: Decimal::from(remaining),
            quantity_unit: "kg".into(),
            price_per_unit: price.map(Decimal::from),
            final_price: None,
            harvest_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn purchase_costs_price_times_remaining() {
        let seller = Uuid::new_v4();
        let plan = plan_purchase(
            &listed_batch(seller, 80, Some(12)),
            Uuid::new_v4(),
            Decimal::from(50_000),
        )
        .unwrap();
        assert_eq!(plan.cost, Decimal::from(960));
        assert_eq!(plan.seller_id, seller);
        assert_eq!(plan.status_after, BatchStatus::InWarehouse);
    }

    #[test]
    fn unpriced_batch_uses_default_price() {
        let plan = plan_purchase(
            &listed_batch(Uuid::new_v4(), 10, None),
            Uuid::new_v4(),
            Decimal::from(1_000),
        )
        .unwrap();
        assert_eq!(plan.cost, Decimal::from(100));
    }

    #[test]
    fn purchase_rejects_wrong_status() {
        let mut batch = listed_batch(Uuid::new_v4(), 80, Some(10));
        batch.status = BatchStatus::InTransit;
        let err = plan_purchase(&batch, Uuid::new_v4(), Decimal::from(50_000)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatus { .. }));
    }

    #[test]
    fn purchase_rejects_exhausted_batch() {
        let err = plan_purchase(
            &listed_batch(Uuid::new_v4(), 0, Some(10)),
            Uuid::new_v4(),
            Decimal::from(50_000),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientQuantity { .. }));
    }

    #[test]
    fn purchase_reports_needed_and_available_funds() {
        let err = plan_purchase(
            &listed_batch(Uuid::new_v4(), 100, Some(10)),
            Uuid::new_v4(),
            Decimal::from(999),
        )
        .unwrap_err();
        match err {
            CoreError::InsufficientFunds { needed, available } => {
                assert_eq!(needed, Decimal::from(1_000));
                assert_eq!(available, Decimal::from(999));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
