//! Batches - the core traceable unit

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a batch. The names double as the taxonomy rows
/// seeded into the `statuses` table; parsing an unknown name is a
/// configuration error at the store layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchStatus {
    Harvested,
    Processing,
    #[serde(rename = "In Warehouse")]
    InWarehouse,
    #[serde(rename = "In Transit")]
    InTransit,
    #[serde(rename = "In Shop")]
    InShop,
    Sold,
}

impl BatchStatus {
    /// All taxonomy entries, in seed order
    pub const ALL: [BatchStatus; 6] = [
        BatchStatus::Harvested,
        BatchStatus::Processing,
        BatchStatus::InWarehouse,
        BatchStatus::InTransit,
        BatchStatus::InShop,
        BatchStatus::Sold,
    ];

    /// Canonical taxonomy name
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Harvested => "Harvested",
            BatchStatus::Processing => "Processing",
            BatchStatus::InWarehouse => "In Warehouse",
            BatchStatus::InTransit => "In Transit",
            BatchStatus::InShop => "In Shop",
            BatchStatus::Sold => "Sold",
        }
    }

    /// Parse a taxonomy name
    pub fn parse(s: &str) -> Option<BatchStatus> {
        BatchStatus::ALL.iter().copied().find(|st| st.as_str() == s)
    }

    /// Whether a batch in this status can be bought whole off the
    /// marketplace
    pub fn purchasable(&self) -> bool {
        matches!(self, BatchStatus::Harvested)
    }

    /// Whether a batch in this status is ready to ship
    pub fn ship_ready(&self) -> bool {
        matches!(self, BatchStatus::InWarehouse | BatchStatus::Processing)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A traceable quantity of a product.
///
/// `parent_batch_id == None` marks a root harvest batch. Children are
/// carved out by splits; the parent's remaining quantity was decremented
/// by exactly the child's initial quantity at split time, so the lineage
/// graph is a forest and quantities are conserved along it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    /// Human/QR-readable unique code
    pub batch_code: String,
    pub product_id: Uuid,
    pub parent_batch_id: Option<Uuid>,
    pub current_owner_id: Uuid,
    pub status: BatchStatus,
    /// Fixed at creation
    pub initial_quantity: Decimal,
    /// Monotonically non-increasing, `0 <= remaining <= initial`
    pub remaining_quantity: Decimal,
    pub quantity_unit: String,
    pub price_per_unit: Option<Decimal>,
    /// Recorded by the retail sale transition
    pub final_price: Option<Decimal>,
    pub harvest_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    /// True for harvest batches with no split ancestry
    pub fn is_root(&self) -> bool {
        self.parent_batch_id.is_none()
    }

    /// Quantity invariant every mutation must preserve
    pub fn quantity_invariant_holds(&self) -> bool {
        self.remaining_quantity >= Decimal::ZERO
            && self.remaining_quantity <= self.initial_quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_round_trip() {
        for status in BatchStatus::ALL {
            assert_eq!(BatchStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BatchStatus::parse("Planted"), None);
    }

    #[test]
    fn only_harvested_is_purchasable() {
        assert!(BatchStatus::Harvested.purchasable());
        assert!(!BatchStatus::InWarehouse.purchasable());
        assert!(!BatchStatus::Sold.purchasable());
    }
}
