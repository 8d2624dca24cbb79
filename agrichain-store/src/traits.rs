//! ChainStore trait
//!
//! The seam between the HTTP layer and persistence. Every mutating
//! method is atomic: it either applies all of its writes or none of
//! them, and serializes against concurrent mutation of the same rows.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use agrichain_core::ledger::{HarvestRequest, OrderItemRequest, SplitRequest};
use agrichain_core::trace::LineageBundle;
use agrichain_core::types::{
    Batch, BatchStatus, DeviceReading, Event, EventAttachment, EventKind, GeoPoint, OrderWithItems,
    Product, Role, User,
};

use crate::error::StoreResult;

/// New user registration row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Direct event-log request
#[derive(Debug, Clone)]
pub struct RecordEventRequest {
    pub actor: Uuid,
    pub actor_role: Role,
    pub batch_id: Uuid,
    pub kind: EventKind,
    pub location: Option<GeoPoint>,
    pub note: Option<String>,
}

/// New attachment on an existing event
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub file_name: String,
    pub file_url: Option<String>,
    pub content_type: Option<String>,
}

/// New device reading on an existing event
#[derive(Debug, Clone)]
pub struct NewDeviceReading {
    pub device_id: String,
    pub payload: Value,
}

/// Marketplace row: a purchasable batch with its farmer and product
#[derive(Debug, Clone, Serialize)]
pub struct MarketListing {
    #[serde(flatten)]
    pub batch: Batch,
    pub product_title: String,
    pub farmer_name: String,
}

/// Result of a split
#[derive(Debug, Clone, Serialize)]
pub struct SplitOutcome {
    pub parent: Batch,
    pub children: Vec<Batch>,
}

/// Result of a whole-batch purchase
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    pub batch: Batch,
    pub seller_id: Uuid,
    pub cost: Decimal,
}

/// Persistence seam. All backends must provide transactional semantics:
/// a failed mutation leaves the ledger exactly as it was.
#[async_trait]
pub trait ChainStore: Send + Sync {
    // ---- users ----

    /// Insert a user; duplicate usernames are a conflict.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    // ---- products ----

    async fn create_product(
        &self,
        farmer_id: Uuid,
        title: String,
        crop_details: Option<String>,
    ) -> StoreResult<Product>;
    async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>>;
    async fn list_products_by_farmer(&self, farmer_id: Uuid) -> StoreResult<Vec<Product>>;

    // ---- batch ledger (transactional) ----

    /// Create a root harvest batch: batch + Harvest event + chain log,
    /// all-or-nothing.
    async fn create_batch(&self, req: HarvestRequest) -> StoreResult<Batch>;

    /// Split a batch under an exclusive parent-row lock.
    async fn split_batch(
        &self,
        actor: Uuid,
        parent_id: Uuid,
        requests: Vec<SplitRequest>,
    ) -> StoreResult<SplitOutcome>;

    /// Whole-batch marketplace purchase with wallet settlement.
    async fn buy_batch(&self, buyer: Uuid, batch_id: Uuid) -> StoreResult<PurchaseOutcome>;

    /// All-or-nothing order across one or more batches of one seller.
    async fn create_order(
        &self,
        buyer: Uuid,
        items: Vec<OrderItemRequest>,
    ) -> StoreResult<OrderWithItems>;

    /// Owner ships a held batch (-> In Transit).
    async fn ship_batch(&self, actor: Uuid, actor_role: Role, batch_id: Uuid)
        -> StoreResult<Batch>;

    /// Transporter hands over to the shop (In Transit -> In Shop).
    async fn deliver_batch(
        &self,
        actor: Uuid,
        actor_role: Role,
        batch_id: Uuid,
    ) -> StoreResult<Batch>;

    /// Shopkeeper retail sale (In Shop -> Sold), recording the final
    /// price and crediting the shopkeeper wallet.
    async fn sell_to_consumer(
        &self,
        actor: Uuid,
        actor_role: Role,
        batch_id: Uuid,
        final_price: Decimal,
    ) -> StoreResult<Batch>;

    // ---- events ----

    async fn record_event(&self, req: RecordEventRequest) -> StoreResult<Event>;
    async fn add_attachment(
        &self,
        actor: Uuid,
        event_id: Uuid,
        attachment: NewAttachment,
    ) -> StoreResult<EventAttachment>;
    async fn add_device_reading(
        &self,
        actor: Uuid,
        event_id: Uuid,
        reading: NewDeviceReading,
    ) -> StoreResult<DeviceReading>;

    // ---- queries ----

    async fn get_batch(&self, batch_id: Uuid) -> StoreResult<Option<Batch>>;
    async fn find_batch_by_code(&self, batch_code: &str) -> StoreResult<Option<Batch>>;
    async fn list_batches_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Batch>>;
    async fn list_batches_by_status(&self, status: BatchStatus) -> StoreResult<Vec<Batch>>;
    /// Purchasable batches with farmer and product context
    async fn list_marketplace(&self) -> StoreResult<Vec<MarketListing>>;
    /// Everything the traceability engine needs for one product, in one
    /// fetch. Takes no locks.
    async fn lineage_bundle(&self, product_id: Uuid) -> StoreResult<LineageBundle>;
    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<OrderWithItems>>;
    async fn get_order(&self, order_id: Uuid) -> StoreResult<Option<OrderWithItems>>;

    /// Backend liveness
    async fn ping(&self) -> StoreResult<()>;
}
