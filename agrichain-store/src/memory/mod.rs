//! In-memory backend
//!
//! Mutex-serialized [`ChainStore`] used by tests and the demo mode.
//! Mutations take the store lock for their whole body, which gives the
//! same winner/loser semantics as the Postgres row locks: concurrent
//! mutations of one batch are strictly ordered and the loser re-validates
//! against the winner's committed state. Every mutation validates through
//! the same core planners as the Postgres backend before touching state,
//! so a rejection leaves the ledger untouched.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use agrichain_core::batch_code::{new_batch_code, new_order_number};
use agrichain_core::ledger::{
    plan_harvest, plan_order, plan_purchase, plan_split, plan_transition, validate_event_log,
    HarvestRequest, OrderItemRequest, SplitRequest, Transition,
};
use agrichain_core::trace::{ActorRef, LineageBundle};
use agrichain_core::types::{
    Batch, BatchStatus, ChainLogEntry, DeviceReading, Event, EventAttachment, EventKind, GeoPoint,
    Order, OrderItem, OrderWithItems, Product, Role, User, WalletEntry, WalletReason,
};
use agrichain_core::CoreError;

use crate::error::StoreResult;
use crate::traits::{
    ChainStore, MarketListing, NewAttachment, NewDeviceReading, NewUser, PurchaseOutcome,
    RecordEventRequest, SplitOutcome,
};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    batches: HashMap<Uuid, Batch>,
    events: Vec<Event>,
    attachments: Vec<EventAttachment>,
    readings: Vec<DeviceReading>,
    chain_logs: Vec<ChainLogEntry>,
    orders: HashMap<Uuid, Order>,
    order_items: Vec<OrderItem>,
    wallet_entries: Vec<WalletEntry>,
}

impl Inner {
    fn append_event(
        &mut self,
        kind: EventKind,
        batch_id: Uuid,
        product_id: Uuid,
        actor: Uuid,
        location: Option<GeoPoint>,
        note: Option<String>,
        status_at_time: BatchStatus,
    ) -> Event {
        let event = Event {
            id: Uuid::new_v4(),
            kind,
            batch_id,
            actor_user_id: actor,
            location,
            note,
            ledger_ref: None,
            recorded_at: Utc::now(),
        };
        self.chain_logs.push(ChainLogEntry {
            log_id: Uuid::new_v4(),
            product_id,
            batch_id,
            event_id: event.id,
            status_at_time,
            logged_at: event.recorded_at,
        });
        self.events.push(event.clone());
        event
    }

    fn adjust_wallet(
        &mut self,
        user_id: Uuid,
        amount: Decimal,
        reason: WalletReason,
        batch_id: Option<Uuid>,
        order_id: Option<Uuid>,
    ) {
        if let Some(user) = self.users.get_mut(&user_id) {
            user.wallet_balance += amount;
            self.wallet_entries.push(WalletEntry {
                id: Uuid::new_v4(),
                user_id,
                amount,
                reason,
                batch_id,
                order_id,
                recorded_at: Utc::now(),
            });
        }
    }

    fn actor_ref(&self, user_id: Uuid) -> Option<ActorRef> {
        self.users.get(&user_id).map(|u| ActorRef {
            user_id: u.user_id,
            username: u.username.clone(),
            role: u.role,
        })
    }
}

/// In-memory [`ChainStore`]
#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChainStore for MemStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.lock().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(CoreError::Conflict("Username already exists".into()).into());
        }
        let created = User {
            user_id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            wallet_balance: user.role.starting_wallet_balance(),
            created_at: Utc::now(),
        };
        inner.users.insert(created.user_id, created.clone());
        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn create_product(
        &self,
        farmer_id: Uuid,
        title: String,
        crop_details: Option<String>,
    ) -> StoreResult<Product> {
        let mut inner = self.inner.lock().await;
        let product = Product {
            id: Uuid::new_v4(),
            farmer_id,
            title,
            crop_details,
            created_at: Utc::now(),
        };
        inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
        let inner = self.inner.lock().await;
        Ok(inner.products.get(&product_id).cloned())
    }

    async fn list_products_by_farmer(&self, farmer_id: Uuid) -> StoreResult<Vec<Product>> {
        let inner = self.inner.lock().await;
        let mut products: Vec<Product> = inner
            .products
            .values()
            .filter(|p| p.farmer_id == farmer_id)
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn create_batch(&self, req: HarvestRequest) -> StoreResult<Batch> {
        let mut inner = self.inner.lock().await;
        let product = inner
            .products
            .get(&req.product_id)
            .ok_or_else(|| CoreError::not_found("Product not found"))?
            .clone();
        let plan = plan_harvest(&product, &req)?;

        let batch = Batch {
            id: Uuid::new_v4(),
            batch_code: new_batch_code(),
            product_id: plan.product_id,
            parent_batch_id: None,
            current_owner_id: plan.owner,
            status: plan.status,
            initial_quantity: plan.initial_quantity,
            remaining_quantity: plan.initial_quantity,
            quantity_unit: plan.quantity_unit,
            price_per_unit: plan.price_per_unit,
            final_price: None,
            harvest_date: plan.harvest_date,
            created_at: Utc::now(),
        };
        inner.batches.insert(batch.id, batch.clone());
        inner.append_event(
            EventKind::Harvest,
            batch.id,
            batch.product_id,
            req.actor,
            None,
            None,
            batch.status,
        );
        Ok(batch)
    }

    async fn split_batch(
        &self,
        actor: Uuid,
        parent_id: Uuid,
        requests: Vec<SplitRequest>,
    ) -> StoreResult<SplitOutcome> {
        let mut inner = self.inner.lock().await;
        let parent = inner
            .batches
            .get(&parent_id)
            .ok_or_else(|| CoreError::not_found("Batch not found"))?
            .clone();
        let plan = plan_split(&parent, actor, &requests)?;

        let mut children = Vec::with_capacity(plan.children.len());
        for child in &plan.children {
            let batch = Batch {
                id: Uuid::new_v4(),
                batch_code: new_batch_code(),
                product_id: parent.product_id,
                parent_batch_id: Some(parent.id),
                current_owner_id: actor,
                status: BatchStatus::Processing,
                initial_quantity: child.quantity,
                remaining_quantity: child.quantity,
                quantity_unit: child.unit.clone(),
                price_per_unit: parent.price_per_unit,
                final_price: None,
                harvest_date: parent.harvest_date,
                created_at: Utc::now(),
            };
            inner.batches.insert(batch.id, batch.clone());
            inner.append_event(
                EventKind::Split,
                batch.id,
                batch.product_id,
                actor,
                None,
                None,
                batch.status,
            );
            children.push(batch);
        }

        let parent_after = {
            let stored = inner
                .batches
                .get_mut(&parent.id)
                .expect("parent still present under the store lock");
            stored.remaining_quantity = plan.parent_remaining_after;
            if let Some(status) = plan.parent_status_after {
                stored.status = status;
            }
            stored.clone()
        };
        Ok(SplitOutcome {
            parent: parent_after,
            children,
        })
    }

    async fn buy_batch(&self, buyer: Uuid, batch_id: Uuid) -> StoreResult<PurchaseOutcome> {
        let mut inner = self.inner.lock().await;
        let batch = inner
            .batches
            .get(&batch_id)
            .ok_or_else(|| CoreError::not_found("Batch not found"))?
            .clone();
        let buyer_balance = inner
            .users
            .get(&buyer)
            .ok_or_else(|| CoreError::not_found("Buyer not found"))?
            .wallet_balance;
        let plan = plan_purchase(&batch, buyer, buyer_balance)?;

        let batch_after = {
            let stored = inner
                .batches
                .get_mut(&batch_id)
                .expect("batch still present under the store lock");
            stored.current_owner_id = buyer;
            stored.status = plan.status_after;
            stored.clone()
        };
        inner.adjust_wallet(
            buyer,
            -plan.cost,
            WalletReason::BatchPurchase,
            Some(batch_id),
            None,
        );
        inner.adjust_wallet(
            plan.seller_id,
            plan.cost,
            WalletReason::BatchSaleProceeds,
            Some(batch_id),
            None,
        );
        inner.append_event(
            EventKind::Sold,
            batch_id,
            batch_after.product_id,
            buyer,
            None,
            None,
            plan.status_after,
        );
        Ok(PurchaseOutcome {
            batch: batch_after,
            seller_id: plan.seller_id,
            cost: plan.cost,
        })
    }

    async fn create_order(
        &self,
        buyer: Uuid,
        items: Vec<OrderItemRequest>,
    ) -> StoreResult<OrderWithItems> {
        let mut inner = self.inner.lock().await;
        let ids: HashSet<Uuid> = items.iter().map(|i| i.batch_id).collect();
        let batch_map: HashMap<Uuid, Batch> = ids
            .iter()
            .filter_map(|id| inner.batches.get(id).map(|b| (*id, b.clone())))
            .collect();
        let plan = plan_order(buyer, &items, &batch_map)?;

        let order = Order {
            id: Uuid::new_v4(),
            order_number: new_order_number(),
            buyer_id: buyer,
            seller_id: plan.seller_id,
            total_amount: plan.total_amount,
            is_completed: false,
            created_at: Utc::now(),
        };
        let mut order_items = Vec::with_capacity(plan.items.len());
        for planned in &plan.items {
            let (product_id, status_at_time) = {
                let stored = inner
                    .batches
                    .get_mut(&planned.batch_id)
                    .expect("batch still present under the store lock");
                stored.remaining_quantity = planned.remaining_after;
                if let Some(status) = planned.status_after {
                    stored.status = status;
                }
                (stored.product_id, stored.status)
            };
            let item = OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                batch_id: planned.batch_id,
                quantity: planned.quantity,
                unit_price: planned.unit_price,
            };
            inner.order_items.push(item.clone());
            order_items.push(item);
            inner.append_event(
                EventKind::Sold,
                planned.batch_id,
                product_id,
                buyer,
                None,
                None,
                status_at_time,
            );
        }
        let completed = Order {
            is_completed: true,
            ..order
        };
        inner.orders.insert(completed.id, completed.clone());
        Ok(OrderWithItems {
            order: completed,
            items: order_items,
        })
    }

    async fn ship_batch(
        &self,
        actor: Uuid,
        actor_role: Role,
        batch_id: Uuid,
    ) -> StoreResult<Batch> {
        self.apply_transition(actor, actor_role, batch_id, Transition::Ship)
            .await
    }

    async fn deliver_batch(
        &self,
        actor: Uuid,
        actor_role: Role,
        batch_id: Uuid,
    ) -> StoreResult<Batch> {
        self.apply_transition(actor, actor_role, batch_id, Transition::Deliver)
            .await
    }

    async fn sell_to_consumer(
        &self,
        actor: Uuid,
        actor_role: Role,
        batch_id: Uuid,
        final_price: Decimal,
    ) -> StoreResult<Batch> {
        self.apply_transition(actor, actor_role, batch_id, Transition::Sell { final_price })
            .await
    }

    async fn record_event(&self, req: RecordEventRequest) -> StoreResult<Event> {
        let mut inner = self.inner.lock().await;
        let batch = inner
            .batches
            .get(&req.batch_id)
            .ok_or_else(|| CoreError::not_found("Batch not found"))?
            .clone();
        validate_event_log(&batch, req.actor, req.actor_role, req.kind)?;
        Ok(inner.append_event(
            req.kind,
            batch.id,
            batch.product_id,
            req.actor,
            req.location,
            req.note,
            batch.status,
        ))
    }

    async fn add_attachment(
        &self,
        actor: Uuid,
        event_id: Uuid,
        attachment: NewAttachment,
    ) -> StoreResult<EventAttachment> {
        let mut inner = self.inner.lock().await;
        let event = inner
            .events
            .iter()
            .find(|e| e.id == event_id)
            .ok_or_else(|| CoreError::not_found("Event not found"))?;
        if event.actor_user_id != actor {
            return Err(CoreError::forbidden("Only the recording actor can attach evidence").into());
        }
        let created = EventAttachment {
            id: Uuid::new_v4(),
            event_id,
            file_name: attachment.file_name,
            file_url: attachment.file_url,
            content_type: attachment.content_type,
            uploaded_at: Utc::now(),
        };
        inner.attachments.push(created.clone());
        Ok(created)
    }

    async fn add_device_reading(
        &self,
        actor: Uuid,
        event_id: Uuid,
        reading: NewDeviceReading,
    ) -> StoreResult<DeviceReading> {
        let mut inner = self.inner.lock().await;
        let event = inner
            .events
            .iter()
            .find(|e| e.id == event_id)
            .ok_or_else(|| CoreError::not_found("Event not found"))?;
        if event.actor_user_id != actor {
            return Err(CoreError::forbidden("Only the recording actor can attach readings").into());
        }
        let created = DeviceReading {
            id: Uuid::new_v4(),
            event_id,
            device_id: reading.device_id,
            payload: reading.payload,
            captured_at: Utc::now(),
        };
        inner.readings.push(created.clone());
        Ok(created)
    }

    async fn get_batch(&self, batch_id: Uuid) -> StoreResult<Option<Batch>> {
        let inner = self.inner.lock().await;
        Ok(inner.batches.get(&batch_id).cloned())
    }

    async fn find_batch_by_code(&self, batch_code: &str) -> StoreResult<Option<Batch>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .batches
            .values()
            .find(|b| b.batch_code == batch_code)
            .cloned())
    }

    async fn list_batches_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Batch>> {
        let inner = self.inner.lock().await;
        let mut batches: Vec<Batch> = inner
            .batches
            .values()
            .filter(|b| b.current_owner_id == owner)
            .cloned()
            .collect();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(batches)
    }

    async fn list_batches_by_status(&self, status: BatchStatus) -> StoreResult<Vec<Batch>> {
        let inner = self.inner.lock().await;
        let mut batches: Vec<Batch> = inner
            .batches
            .values()
            .filter(|b| b.status == status)
            .cloned()
            .collect();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(batches)
    }

    async fn list_marketplace(&self) -> StoreResult<Vec<MarketListing>> {
        let inner = self.inner.lock().await;
        let mut listings: Vec<MarketListing> = inner
            .batches
            .values()
            .filter(|b| b.status.purchasable() && b.remaining_quantity > Decimal::ZERO)
            .map(|b| {
                let product = inner.products.get(&b.product_id);
                let farmer = product.and_then(|p| inner.users.get(&p.farmer_id));
                MarketListing {
                    batch: b.clone(),
                    product_title: product.map(|p| p.title.clone()).unwrap_or_default(),
                    farmer_name: farmer.map(|u| u.username.clone()).unwrap_or_default(),
                }
            })
            .collect();
        listings.sort_by(|a, b| b.batch.created_at.cmp(&a.batch.created_at));
        Ok(listings)
    }

    async fn lineage_bundle(&self, product_id: Uuid) -> StoreResult<LineageBundle> {
        let inner = self.inner.lock().await;
        let batches: Vec<Batch> = inner
            .batches
            .values()
            .filter(|b| b.product_id == product_id)
            .cloned()
            .collect();
        let batch_ids: HashSet<Uuid> = batches.iter().map(|b| b.id).collect();
        let mut events: Vec<Event> = inner
            .events
            .iter()
            .filter(|e| batch_ids.contains(&e.batch_id))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        let event_ids: HashSet<Uuid> = events.iter().map(|e| e.id).collect();

        let actor_ids: HashSet<Uuid> = events
            .iter()
            .map(|e| e.actor_user_id)
            .chain(batches.iter().map(|b| b.current_owner_id))
            .collect();

        Ok(LineageBundle {
            attachments: inner
                .attachments
                .iter()
                .filter(|a| event_ids.contains(&a.event_id))
                .cloned()
                .collect(),
            readings: inner
                .readings
                .iter()
                .filter(|r| event_ids.contains(&r.event_id))
                .cloned()
                .collect(),
            actors: actor_ids
                .into_iter()
                .filter_map(|id| inner.actor_ref(id))
                .collect(),
            batches,
            events,
        })
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<OrderWithItems>> {
        let inner = self.inner.lock().await;
        let mut orders: Vec<OrderWithItems> = inner
            .orders
            .values()
            .filter(|o| o.buyer_id == user_id || o.seller_id == user_id)
            .map(|o| OrderWithItems {
                order: o.clone(),
                items: inner
                    .order_items
                    .iter()
                    .filter(|i| i.order_id == o.id)
                    .cloned()
                    .collect(),
            })
            .collect();
        orders.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        Ok(orders)
    }

    async fn get_order(&self, order_id: Uuid) -> StoreResult<Option<OrderWithItems>> {
        let inner = self.inner.lock().await;
        Ok(inner.orders.get(&order_id).map(|o| OrderWithItems {
            order: o.clone(),
            items: inner
                .order_items
                .iter()
                .filter(|i| i.order_id == o.id)
                .cloned()
                .collect(),
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

impl MemStore {
    async fn apply_transition(
        &self,
        actor: Uuid,
        actor_role: Role,
        batch_id: Uuid,
        transition: Transition,
    ) -> StoreResult<Batch> {
        let mut inner = self.inner.lock().await;
        let batch = inner
            .batches
            .get(&batch_id)
            .ok_or_else(|| CoreError::not_found("Batch not found"))?
            .clone();
        let plan = plan_transition(&batch, actor, actor_role, transition)?;

        let batch_after = {
            let stored = inner
                .batches
                .get_mut(&batch_id)
                .expect("batch still present under the store lock");
            stored.status = plan.status_after;
            if plan.final_price.is_some() {
                stored.final_price = plan.final_price;
            }
            stored.clone()
        };
        if let Some(credit) = plan.credit_actor {
            inner.adjust_wallet(
                actor,
                credit,
                WalletReason::RetailSaleProceeds,
                Some(batch_id),
                None,
            );
        }
        inner.append_event(
            plan.event,
            batch_id,
            batch_after.product_id,
            actor,
            None,
            None,
            plan.status_after,
        );
        Ok(batch_after)
    }
}
