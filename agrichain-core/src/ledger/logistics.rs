//! Logistics transitions
//!
//! Guarded single-row status transitions: ship, deliver, retail sale.
//! Each names the violated precondition when it rejects.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Batch, BatchStatus, EventKind, Role};

/// Requested transition
#[derive(Debug, Clone, Copy)]
pub enum Transition {
    /// Owner sends a held batch on the road
    Ship,
    /// Transporter hands the batch to the shop
    Deliver,
    /// Shopkeeper sells to a walk-in consumer at a final price
    Sell { final_price: Decimal },
}

/// Validated transition
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub status_after: BatchStatus,
    pub event: EventKind,
    /// Wallet credit for the acting user (retail proceeds)
    pub credit_actor: Option<Decimal>,
    /// Final price to record on the batch
    pub final_price: Option<Decimal>,
}

/// Validate a logistics transition against the locked batch snapshot.
pub fn plan_transition(
    batch: &Batch,
    actor: Uuid,
    actor_role: Role,
    transition: Transition,
) -> CoreResult<TransitionPlan> {
    match transition {
        Transition::Ship => {
            if batch.current_owner_id != actor {
                return Err(CoreError::forbidden("You do not own this batch"));
            }
            if !batch.status.ship_ready() {
                return Err(CoreError::InvalidStatus {
                    batch_code: batch.batch_code.clone(),
                    actual: batch.status,
                    expected: format!(
                        "{} or {}",
                        BatchStatus::InWarehouse,
                        BatchStatus::Processing
                    ),
                });
            }
            Ok(TransitionPlan {
                status_after: BatchStatus::InTransit,
                event: EventKind::TransportStart,
                credit_actor: None,
                final_price: None,
            })
        }
        Transition::Deliver => {
            if actor_role != Role::Transporter {
                return Err(CoreError::forbidden("Only transporters can deliver"));
            }
            if batch.status != BatchStatus::InTransit {
                return Err(CoreError::InvalidStatus {
                    batch_code: batch.batch_code.clone(),
                    actual: batch.status,
                    expected: BatchStatus::InTransit.as_str().to_string(),
                });
            }
            Ok(TransitionPlan {
                status_after: BatchStatus::InShop,
                event: EventKind::TransportEnd,
                credit_actor: None,
                final_price: None,
            })
        }
        Transition::Sell { final_price } => {
            if actor_role != Role::Shopkeeper {
                return Err(CoreError::forbidden("Only shopkeepers can sell to consumers"));
            }
            if final_price <= Decimal::ZERO {
                return Err(CoreError::validation(
                    "final_price must be greater than zero",
                ));
            }
            if batch.status != BatchStatus::InShop {
                return Err(CoreError::InvalidStatus {
                    batch_code: batch.batch_code.clone(),
                    actual: batch.status,
                    expected: BatchStatus::InShop.as_str().to_string(),
                });
            }
            Ok(TransitionPlan {
                status_after: BatchStatus::Sold,
                event: EventKind::RetailSale,
                credit_actor: Some(final_price),
                final_price: Some(final_price),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn batch(owner: Uuid, status: BatchStatus) -> Batch {
        Batch {
            id: Uuid::new_v4(),
            batch_code: "AGB-TEST-LOG".into(),
            product_id: Uuid::new_v4(),
            parent_batch_id: None,
            current_owner_id: owner,
            status,
            initial_quantity: Decimal::from(40),
            remaining_quantity: Decimal::from(40),
            quantity_unit: "kg".into(),
            price_per_unit: None,
            final_price: None,
            harvest_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ship_requires_ownership_and_ready_status() {
        let owner = Uuid::new_v4();
        let plan = plan_transition(
            &batch(owner, BatchStatus::InWarehouse),
            owner,
            Role::Distributor,
            Transition::Ship,
        )
        .unwrap();
        assert_eq!(plan.status_after, BatchStatus::InTransit);
        assert_eq!(plan.event, EventKind::TransportStart);

        let err = plan_transition(
            &batch(owner, BatchStatus::InWarehouse),
            Uuid::new_v4(),
            Role::Distributor,
            Transition::Ship,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let err = plan_transition(
            &batch(owner, BatchStatus::InTransit),
            owner,
            Role::Distributor,
            Transition::Ship,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatus { .. }));
    }

    #[test]
    fn deliver_moves_in_transit_to_in_shop() {
        let plan = plan_transition(
            &batch(Uuid::new_v4(), BatchStatus::InTransit),
            Uuid::new_v4(),
            Role::Transporter,
            Transition::Deliver,
        )
        .unwrap();
        assert_eq!(plan.status_after, BatchStatus::InShop);

        let err = plan_transition(
            &batch(Uuid::new_v4(), BatchStatus::InShop),
            Uuid::new_v4(),
            Role::Transporter,
            Transition::Deliver,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatus { .. }));
    }

    #[test]
    fn retail_sale_credits_actor_and_records_price() {
        let price = Decimal::from(500);
        let plan = plan_transition(
            &batch(Uuid::new_v4(), BatchStatus::InShop),
            Uuid::new_v4(),
            Role::Shopkeeper,
            Transition::Sell { final_price: price },
        )
        .unwrap();
        assert_eq!(plan.status_after, BatchStatus::Sold);
        assert_eq!(plan.event, EventKind::RetailSale);
        assert_eq!(plan.credit_actor, Some(price));
        assert_eq!(plan.final_price, Some(price));
    }

    #[test]
    fn sell_rejects_wrong_role_and_bad_price() {
        let err = plan_transition(
            &batch(Uuid::new_v4(), BatchStatus::InShop),
            Uuid::new_v4(),
            Role::Distributor,
            Transition::Sell {
                final_price: Decimal::from(10),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let err = plan_transition(
            &batch(Uuid::new_v4(), BatchStatus::InShop),
            Uuid::new_v4(),
            Role::Shopkeeper,
            Transition::Sell {
                final_price: Decimal::ZERO,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
