//! Orders and the wallet ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order header. `total_amount` is the sum of item subtotals; the order
/// becomes immutable once `is_completed` flips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub total_amount: Decimal,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// One line of an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Order with its items embedded, the shape read endpoints return
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Why a wallet balance moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletReason {
    BatchPurchase,
    BatchSaleProceeds,
    RetailSaleProceeds,
}

impl WalletReason {
    /// Canonical name stored in the wallet ledger
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletReason::BatchPurchase => "batch_purchase",
            WalletReason::BatchSaleProceeds => "batch_sale_proceeds",
            WalletReason::RetailSaleProceeds => "retail_sale_proceeds",
        }
    }
}

/// Append-only debit/credit row written in the same transaction as the
/// balance update it explains. Negative amount is a debit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub reason: WalletReason,
    pub batch_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
}
