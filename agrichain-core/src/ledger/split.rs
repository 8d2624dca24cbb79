//! Split planning
//!
//! A split carves child batches out of a parent under an exclusive row
//! lock. The planner checks ownership and quantity conservation against
//! the locked snapshot; the store applies the plan atomically.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Batch, BatchStatus};

/// One requested child. A missing unit inherits the parent's.
#[derive(Debug, Clone, Deserialize)]
pub struct SplitRequest {
    pub quantity: Decimal,
    pub unit: Option<String>,
}

/// One child to create
#[derive(Debug, Clone)]
pub struct PlannedChild {
    pub quantity: Decimal,
    pub unit: String,
}

/// Validated split plan
#[derive(Debug, Clone)]
pub struct SplitPlan {
    pub children: Vec<PlannedChild>,
    /// Sum of child quantities, the amount deducted from the parent
    pub total: Decimal,
    pub parent_remaining_after: Decimal,
    /// Set when the split drains the parent
    pub parent_status_after: Option<BatchStatus>,
}

/// Validate a split against the locked parent snapshot.
///
/// Zero-quantity entries are skipped, negative ones rejected; the filtered
/// list must be non-empty and its total must fit in the parent's current
/// remaining quantity. Children are created as `Processing`; a drained
/// parent moves to `In Warehouse`.
pub fn plan_split(parent: &Batch, actor: Uuid, requests: &[SplitRequest]) -> CoreResult<SplitPlan> {
    if requests.is_empty() {
        return Err(CoreError::validation("splits list must not be empty"));
    }
    if parent.current_owner_id != actor {
        return Err(CoreError::forbidden("You do not own this batch"));
    }

    let mut children = Vec::with_capacity(requests.len());
    let mut total = Decimal::ZERO;
    for req in requests {
        if req.quantity < Decimal::ZERO {
            return Err(CoreError::validation("split quantity cannot be negative"));
        }
        if req.quantity == Decimal::ZERO {
            continue;
        }
        let unit = req
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(&parent.quantity_unit)
            .to_string();
        total += req.quantity;
        children.push(PlannedChild {
            quantity: req.quantity,
            unit,
        });
    }

    if children.is_empty() {
        return Err(CoreError::validation(
            "splits list must contain at least one non-zero quantity",
        ));
    }
    if total > parent.remaining_quantity {
        return Err(CoreError::InsufficientQuantity {
            batch_code: parent.batch_code.clone(),
            available: parent.remaining_quantity,
            requested: total,
        });
    }

    let remaining_after = parent.remaining_quantity - total;
    Ok(SplitPlan {
        children,
        total,
        parent_remaining_after: remaining_after,
        parent_status_after: (remaining_after == Decimal::ZERO).then_some(BatchStatus::InWarehouse),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn parent(owner: Uuid, remaining: i64) -> Batch {
        Batch {
            id: Uuid::new_v4(),
            batch_code: "AGB-TEST-PARENT".into(),
            product_id: Uuid::new_v4(),
            parent_batch_id: None,
            current_owner_id: owner,
            status: BatchStatus::Harvested,
            initial_quantity: Decimal::from(100),
            remaining_quantity: Decimal::from(remaining),
            quantity_unit: "kg".into(),
            price_per_unit: None,
            final_price: None,
            harvest_date: None,
            created_at: Utc::now(),
        }
    }

    fn req(q: i64) -> SplitRequest {
        SplitRequest {
            quantity: Decimal::from(q),
            unit: None,
        }
    }

    #[test]
    fn split_conserves_quantity() {
        let owner = Uuid::new_v4();
        let plan = plan_split(&parent(owner, 100), owner, &[req(40), req(60)]).unwrap();
        assert_eq!(plan.total, Decimal::from(100));
        assert_eq!(plan.parent_remaining_after, Decimal::ZERO);
        assert_eq!(plan.parent_status_after, Some(BatchStatus::InWarehouse));
        assert_eq!(plan.children.len(), 2);
    }

    #[test]
    fn partial_split_leaves_parent_in_place() {
        let owner = Uuid::new_v4();
        let plan = plan_split(&parent(owner, 100), owner, &[req(30)]).unwrap();
        assert_eq!(plan.parent_remaining_after, Decimal::from(70));
        assert_eq!(plan.parent_status_after, None);
    }

    #[test]
    fn split_rejects_over_request() {
        let owner = Uuid::new_v4();
        let err = plan_split(&parent(owner, 50), owner, &[req(30), req(30)]).unwrap_err();
        match err {
            CoreError::InsufficientQuantity {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, Decimal::from(50));
                assert_eq!(requested, Decimal::from(60));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn split_rejects_non_owner() {
        let err = plan_split(&parent(Uuid::new_v4(), 100), Uuid::new_v4(), &[req(10)]).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn split_skips_zero_and_rejects_negative() {
        let owner = Uuid::new_v4();
        let plan = plan_split(&parent(owner, 100), owner, &[req(0), req(25)]).unwrap();
        assert_eq!(plan.children.len(), 1);

        let err = plan_split(&parent(owner, 100), owner, &[req(-5)]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = plan_split(&parent(owner, 100), owner, &[req(0)]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn children_inherit_parent_unit() {
        let owner = Uuid::new_v4();
        let plan = plan_split(
            &parent(owner, 100),
            owner,
            &[
                SplitRequest {
                    quantity: Decimal::from(10),
                    unit: Some("crate".into()),
                },
                req(10),
            ],
        )
        .unwrap();
        assert_eq!(plan.children[0].unit, "crate");
        assert_eq!(plan.children[1].unit, "kg");
    }
}
