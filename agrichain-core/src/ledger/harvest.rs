//! Create-batch (harvest) planning

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{BatchStatus, Product};

/// Input for creating a root harvest batch
#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub actor: Uuid,
    pub product_id: Uuid,
    pub initial_quantity: Decimal,
    pub quantity_unit: String,
    pub price_per_unit: Option<Decimal>,
    pub harvest_date: Option<NaiveDate>,
}

/// Validated harvest plan: one root batch + one Harvest event
#[derive(Debug, Clone)]
pub struct HarvestPlan {
    pub product_id: Uuid,
    pub owner: Uuid,
    pub initial_quantity: Decimal,
    pub quantity_unit: String,
    pub price_per_unit: Option<Decimal>,
    pub harvest_date: Option<NaiveDate>,
    pub status: BatchStatus,
}

/// Validate a harvest request against the owning product.
pub fn plan_harvest(product: &Product, req: &HarvestRequest) -> CoreResult<HarvestPlan> {
    if req.initial_quantity <= Decimal::ZERO {
        return Err(CoreError::validation(
            "initial_quantity must be greater than zero",
        ));
    }
    if req.quantity_unit.trim().is_empty() {
        return Err(CoreError::validation("quantity_unit is required"));
    }
    if let Some(price) = req.price_per_unit {
        if price < Decimal::ZERO {
            return Err(CoreError::validation("price_per_unit cannot be negative"));
        }
    }
    if product.farmer_id != req.actor {
        return Err(CoreError::forbidden("You do not own this product"));
    }

    Ok(HarvestPlan {
        product_id: product.id,
        owner: req.actor,
        initial_quantity: req.initial_quantity,
        quantity_unit: req.quantity_unit.trim().to_string(),
        price_per_unit: req.price_per_unit,
        harvest_date: req.harvest_date,
        status: BatchStatus::Harvested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(farmer: Uuid) -> Product {
        Product {
            id: Uuid::new_v4(),
            farmer_id: farmer,
            title: "Basmati Rice".into(),
            crop_details: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn harvest_rejects_non_positive_quantity() {
        let farmer = Uuid::new_v4();
        let req = HarvestRequest {
            actor: farmer,
            product_id: Uuid::new_v4(),
            initial_quantity: Decimal::ZERO,
            quantity_unit: "kg".into(),
            price_per_unit: None,
            harvest_date: None,
        };
        let err = plan_harvest(&product(farmer), &req).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn harvest_rejects_foreign_product() {
        let req = HarvestRequest {
            actor: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            initial_quantity: Decimal::from(100),
            quantity_unit: "kg".into(),
            price_per_unit: None,
            harvest_date: None,
        };
        let err = plan_harvest(&product(Uuid::new_v4()), &req).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn harvest_plan_starts_as_harvested() {
        let farmer = Uuid::new_v4();
        let req = HarvestRequest {
            actor: farmer,
            product_id: Uuid::new_v4(),
            initial_quantity: Decimal::from(100),
            quantity_unit: " kg ".into(),
            price_per_unit: Some(Decimal::from(12)),
            harvest_date: None,
        };
        let plan = plan_harvest(&product(farmer), &req).unwrap();
        assert_eq!(plan.status, BatchStatus::Harvested);
        assert_eq!(plan.quantity_unit, "kg");
    }
}
