//! PostgreSQL backend
//!
//! Every mutation is a single transaction; the batch and wallet rows a
//! decision depends on are locked with `SELECT ... FOR UPDATE` first, so
//! concurrent mutations of the same batch serialize and the loser
//! re-validates against the winner's committed state. Locks for
//! multi-row operations are taken in one statement.

mod rows;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use agrichain_core::batch_code::{new_batch_code, new_order_number};
use agrichain_core::ledger::{
    plan_harvest, plan_order, plan_purchase, plan_split, plan_transition, validate_event_log,
    HarvestRequest, OrderItemRequest, SplitRequest, Transition,
};
use agrichain_core::trace::LineageBundle;
use agrichain_core::types::{
    Batch, BatchStatus, DeviceReading, Event, EventAttachment, EventKind, GeoPoint, Order,
    OrderItem, OrderWithItems, Product, Role, User, WalletReason,
};
use agrichain_core::CoreError;

use crate::error::{StoreError, StoreResult};
use crate::schema::{CHAIN_SCHEMA, TAXONOMY_SEED};
use crate::traits::{
    ChainStore, MarketListing, NewAttachment, NewDeviceReading, NewUser, PurchaseOutcome,
    RecordEventRequest, SplitOutcome,
};

use rows::{
    AttachmentRow, BatchRow, DeviceReadingRow, EventRow, OrderItemRow, OrderRow, ProductRow,
    UserRow, BATCH_SELECT, EVENT_SELECT,
};

type PgTx<'a> = Transaction<'a, Postgres>;

/// Taxonomy name -> id maps, loaded once at connect time. Reference data
/// is immutable after init, so caching it does not violate the
/// no-mutable-state-caching rule.
#[derive(Debug, Clone, Default)]
struct Taxonomy {
    status_ids: HashMap<BatchStatus, i32>,
    event_type_ids: HashMap<EventKind, i32>,
}

impl Taxonomy {
    fn status_id(&self, status: BatchStatus) -> StoreResult<i32> {
        self.status_ids.get(&status).copied().ok_or_else(|| {
            StoreError::Domain(CoreError::Config(format!("status '{status}'")))
        })
    }

    fn event_type_id(&self, kind: EventKind) -> StoreResult<i32> {
        self.event_type_ids.get(&kind).copied().ok_or_else(|| {
            StoreError::Domain(CoreError::Config(format!("event type '{kind}'")))
        })
    }
}

/// PostgreSQL-backed [`ChainStore`]
pub struct PgStore {
    pool: PgPool,
    taxonomy: Taxonomy,
}

impl PgStore {
    /// Connect, initialize the schema and load the taxonomy. Fails fast
    /// when a required taxonomy row cannot be seeded.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect(database_url)
            .await?;
        Self::from_pool(pool).await
    }

    /// Build from an existing pool (initializes schema + taxonomy).
    pub async fn from_pool(pool: PgPool) -> StoreResult<Self> {
        sqlx::raw_sql(CHAIN_SCHEMA).execute(&pool).await?;
        sqlx::raw_sql(TAXONOMY_SEED).execute(&pool).await?;
        let taxonomy = Self::load_taxonomy(&pool).await?;
        tracing::info!(
            statuses = taxonomy.status_ids.len(),
            event_types = taxonomy.event_type_ids.len(),
            "database schema ready"
        );
        Ok(Self { pool, taxonomy })
    }

    /// Underlying pool, for seeding and diagnostics
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_taxonomy(pool: &PgPool) -> StoreResult<Taxonomy> {
        let mut taxonomy = Taxonomy::default();
        let statuses: Vec<(i32, String)> = sqlx::query_as("SELECT id, name FROM statuses")
            .fetch_all(pool)
            .await?;
        for (id, name) in statuses {
            if let Some(status) = BatchStatus::parse(&name) {
                taxonomy.status_ids.insert(status, id);
            }
        }
        let event_types: Vec<(i32, String)> = sqlx::query_as("SELECT id, name FROM event_types")
            .fetch_all(pool)
            .await?;
        for (id, name) in event_types {
            if let Some(kind) = EventKind::parse(&name) {
                taxonomy.event_type_ids.insert(kind, id);
            }
        }
        // Fail fast on an incomplete taxonomy rather than at first use
        for status in BatchStatus::ALL {
            taxonomy.status_id(status)?;
        }
        for kind in EventKind::ALL {
            taxonomy.event_type_id(kind)?;
        }
        Ok(taxonomy)
    }

    async fn fetch_batch_tx(
        tx: &mut PgTx<'_>,
        batch_id: Uuid,
        lock: bool,
    ) -> StoreResult<Option<Batch>> {
        let query = if lock {
            format!("{BATCH_SELECT} WHERE b.id = $1 FOR UPDATE OF b")
        } else {
            format!("{BATCH_SELECT} WHERE b.id = $1")
        };
        let row: Option<BatchRow> = sqlx::query_as(&query)
            .bind(batch_id)
            .fetch_optional(&mut **tx)
            .await?;
        row.map(BatchRow::into_batch).transpose()
    }

    /// Lock every batch in `ids` in one statement (avoids ordering
    /// deadlocks between concurrent multi-batch transactions).
    async fn fetch_batches_locked(tx: &mut PgTx<'_>, ids: &[Uuid]) -> StoreResult<Vec<Batch>> {
        let query = format!("{BATCH_SELECT} WHERE b.id = ANY($1) FOR UPDATE OF b");
        let rows: Vec<BatchRow> = sqlx::query_as(&query)
            .bind(ids)
            .fetch_all(&mut **tx)
            .await?;
        rows.into_iter().map(BatchRow::into_batch).collect()
    }

    async fn insert_batch_tx(&self, tx: &mut PgTx<'_>, batch: &Batch) -> StoreResult<()> {
        let status_id = self.taxonomy.status_id(batch.status)?;
        sqlx::query(
            r#"INSERT INTO batches
                   (id, batch_code, product_id, parent_batch_id, current_owner_id,
                    current_status_id, initial_quantity, remaining_quantity,
                    quantity_unit, price_per_unit, final_price, harvest_date, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(batch.id)
        .bind(&batch.batch_code)
        .bind(batch.product_id)
        .bind(batch.parent_batch_id)
        .bind(batch.current_owner_id)
        .bind(status_id)
        .bind(batch.initial_quantity)
        .bind(batch.remaining_quantity)
        .bind(&batch.quantity_unit)
        .bind(batch.price_per_unit)
        .bind(batch.final_price)
        .bind(batch.harvest_date)
        .bind(batch.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Append an immutable event plus its write-once chain-log row.
    #[allow(clippy::too_many_arguments)]
    async fn append_event_tx(
        &self,
        tx: &mut PgTx<'_>,
        kind: EventKind,
        batch_id: Uuid,
        product_id: Uuid,
        actor: Uuid,
        location: Option<GeoPoint>,
        note: Option<String>,
        status_at_time: BatchStatus,
    ) -> StoreResult<Event> {
        let event_type_id = self.taxonomy.event_type_id(kind)?;
        let status_id = self.taxonomy.status_id(status_at_time)?;
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
        sqlx::query(
            r#"INSERT INTO events
                   (id, event_type_id, batch_id, actor_user_id,
                    location_lat, location_lon, note, ledger_ref, recorded_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(event.id)
        .bind(event_type_id)
        .bind(event.batch_id)
        .bind(event.actor_user_id)
        .bind(event.location.map(|l| l.lat))
        .bind(event.location.map(|l| l.lon))
        .bind(&event.note)
        .bind(&event.ledger_ref)
        .bind(event.recorded_at)
        .execute(&mut **tx)
        .await?;
        sqlx::query(
            r#"INSERT INTO product_chain_logs (log_id, product_id, batch_id, event_id, status_id, logged_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(batch_id)
        .bind(event.id)
        .bind(status_id)
        .bind(event.recorded_at)
        .execute(&mut **tx)
        .await?;
        Ok(event)
    }

    /// Lock wallet rows in one statement and return their balances.
    async fn lock_wallets_tx(
        tx: &mut PgTx<'_>,
        user_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, Decimal>> {
        let rows: Vec<(Uuid, Decimal)> = sqlx::query_as(
            "SELECT user_id, wallet_balance FROM users WHERE user_id = ANY($1) FOR UPDATE",
        )
        .bind(user_ids)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Apply a signed wallet delta together with its ledger entry.
    async fn adjust_wallet_tx(
        tx: &mut PgTx<'_>,
        user_id: Uuid,
        amount: Decimal,
        reason: WalletReason,
        batch_id: Option<Uuid>,
        order_id: Option<Uuid>,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE users SET wallet_balance = wallet_balance + $1 WHERE user_id = $2")
            .bind(amount)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query(
            r#"INSERT INTO wallet_entries (id, user_id, amount, reason, batch_id, order_id, recorded_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(amount)
        .bind(reason.as_str())
        .bind(batch_id)
        .bind(order_id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn update_batch_status_tx(
        &self,
        tx: &mut PgTx<'_>,
        batch_id: Uuid,
        status: BatchStatus,
    ) -> StoreResult<()> {
        let status_id = self.taxonomy.status_id(status)?;
        sqlx::query("UPDATE batches SET current_status_id = $1 WHERE id = $2")
            .bind(status_id)
            .bind(batch_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn order_with_items(&self, order: Order) -> StoreResult<OrderWithItems> {
        let items: Vec<OrderItemRow> =
            sqlx::query_as("SELECT id, order_id, batch_id, quantity, unit_price FROM order_items WHERE order_id = $1")
                .bind(order.id)
                .fetch_all(&self.pool)
                .await?;
        Ok(OrderWithItems {
            order,
            items: items.into_iter().map(OrderItem::from).collect(),
        })
    }
}

#[async_trait]
impl ChainStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM users WHERE username = $1")
                .bind(&user.username)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
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
        sqlx::query(
            r#"INSERT INTO users (user_id, username, password_hash, role, wallet_balance, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(created.user_id)
        .bind(&created.username)
        .bind(&created.password_hash)
        .bind(created.role.as_str())
        .bind(created.wallet_balance)
        .bind(created.created_at)
        .execute(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, username, password_hash, role, wallet_balance, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, username, password_hash, role, wallet_balance, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn create_product(
        &self,
        farmer_id: Uuid,
        title: String,
        crop_details: Option<String>,
    ) -> StoreResult<Product> {
        let product = Product {
            id: Uuid::new_v4(),
            farmer_id,
            title,
            crop_details,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO products (id, farmer_id, title, crop_details, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(product.id)
        .bind(product.farmer_id)
        .bind(&product.title)
        .bind(&product.crop_details)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(product)
    }

    async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, farmer_id, title, crop_details, created_at FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn list_products_by_farmer(&self, farmer_id: Uuid) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT id, farmer_id, title, crop_details, created_at FROM products WHERE farmer_id = $1 ORDER BY created_at DESC",
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn create_batch(&self, req: HarvestRequest) -> StoreResult<Batch> {
        let mut tx = self.pool.begin().await?;
        let product: Option<ProductRow> = sqlx::query_as(
            "SELECT id, farmer_id, title, crop_details, created_at FROM products WHERE id = $1",
        )
        .bind(req.product_id)
        .fetch_optional(&mut *tx)
        .await?;
        let product = Product::from(
            product.ok_or_else(|| CoreError::not_found("Product not found"))?,
        );
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
        self.insert_batch_tx(&mut tx, &batch).await?;
        self.append_event_tx(
            &mut tx,
            EventKind::Harvest,
            batch.id,
            batch.product_id,
            req.actor,
            None,
            None,
            batch.status,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(batch_code = %batch.batch_code, product_id = %batch.product_id, "batch created");
        Ok(batch)
    }

    async fn split_batch(
        &self,
        actor: Uuid,
        parent_id: Uuid,
        requests: Vec<SplitRequest>,
    ) -> StoreResult<SplitOutcome> {
        let mut tx = self.pool.begin().await?;
        let parent = Self::fetch_batch_tx(&mut tx, parent_id, true)
            .await?
            .ok_or_else(|| CoreError::not_found("Batch not found"))?;
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
            self.insert_batch_tx(&mut tx, &batch).await?;
            self.append_event_tx(
                &mut tx,
                EventKind::Split,
                batch.id,
                batch.product_id,
                actor,
                None,
                None,
                batch.status,
            )
            .await?;
            children.push(batch);
        }

        let parent_status = plan.parent_status_after.unwrap_or(parent.status);
        let parent_status_id = self.taxonomy.status_id(parent_status)?;
        sqlx::query(
            "UPDATE batches SET remaining_quantity = $1, current_status_id = $2 WHERE id = $3",
        )
        .bind(plan.parent_remaining_after)
        .bind(parent_status_id)
        .bind(parent.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(
            parent = %parent.batch_code,
            children = children.len(),
            total = %plan.total,
            "batch split"
        );
        let parent_after = Batch {
            remaining_quantity: plan.parent_remaining_after,
            status: parent_status,
            ..parent
        };
        Ok(SplitOutcome {
            parent: parent_after,
            children,
        })
    }

    async fn buy_batch(&self, buyer: Uuid, batch_id: Uuid) -> StoreResult<PurchaseOutcome> {
        let mut tx = self.pool.begin().await?;
        let batch = Self::fetch_batch_tx(&mut tx, batch_id, true)
            .await?
            .ok_or_else(|| CoreError::not_found("Batch not found"))?;

        let wallet_ids = vec![buyer, batch.current_owner_id];
        let wallets = Self::lock_wallets_tx(&mut tx, &wallet_ids).await?;
        let buyer_balance = *wallets
            .get(&buyer)
            .ok_or_else(|| CoreError::not_found("Buyer not found"))?;

        let plan = plan_purchase(&batch, buyer, buyer_balance)?;

        let status_id = self.taxonomy.status_id(plan.status_after)?;
        sqlx::query(
            "UPDATE batches SET current_owner_id = $1, current_status_id = $2 WHERE id = $3",
        )
        .bind(buyer)
        .bind(status_id)
        .bind(batch.id)
        .execute(&mut *tx)
        .await?;

        Self::adjust_wallet_tx(
            &mut tx,
            buyer,
            -plan.cost,
            WalletReason::BatchPurchase,
            Some(batch.id),
            None,
        )
        .await?;
        Self::adjust_wallet_tx(
            &mut tx,
            plan.seller_id,
            plan.cost,
            WalletReason::BatchSaleProceeds,
            Some(batch.id),
            None,
        )
        .await?;

        self.append_event_tx(
            &mut tx,
            EventKind::Sold,
            batch.id,
            batch.product_id,
            buyer,
            None,
            None,
            plan.status_after,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(batch_code = %batch.batch_code, %buyer, cost = %plan.cost, "batch purchased");
        let batch_after = Batch {
            current_owner_id: buyer,
            status: plan.status_after,
            ..batch
        };
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
        let mut tx = self.pool.begin().await?;

        // De-duplicated lock set, one statement
        let ids: Vec<Uuid> = items
            .iter()
            .map(|i| i.batch_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let batches = Self::fetch_batches_locked(&mut tx, &ids).await?;
        let batch_map: HashMap<Uuid, Batch> = batches.into_iter().map(|b| (b.id, b)).collect();

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
        sqlx::query(
            r#"INSERT INTO orders (id, order_number, buyer_id, seller_id, total_amount, is_completed, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.buyer_id)
        .bind(order.seller_id)
        .bind(order.total_amount)
        .bind(order.is_completed)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        let mut order_items = Vec::with_capacity(plan.items.len());
        for planned in &plan.items {
            let batch = &batch_map[&planned.batch_id];
            sqlx::query("UPDATE batches SET remaining_quantity = $1 WHERE id = $2")
                .bind(planned.remaining_after)
                .bind(planned.batch_id)
                .execute(&mut *tx)
                .await?;
            let status_at_time = match planned.status_after {
                Some(status) => {
                    self.update_batch_status_tx(&mut tx, planned.batch_id, status)
                        .await?;
                    status
                }
                None => batch.status,
            };

            let item = OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                batch_id: planned.batch_id,
                quantity: planned.quantity,
                unit_price: planned.unit_price,
            };
            sqlx::query(
                "INSERT INTO order_items (id, order_id, batch_id, quantity, unit_price) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(item.id)
            .bind(item.order_id)
            .bind(item.batch_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
            order_items.push(item);

            self.append_event_tx(
                &mut tx,
                EventKind::Sold,
                planned.batch_id,
                batch.product_id,
                buyer,
                None,
                None,
                status_at_time,
            )
            .await?;
        }

        sqlx::query("UPDATE orders SET is_completed = TRUE WHERE id = $1")
            .bind(order.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            items = order_items.len(),
            total = %order.total_amount,
            "order completed"
        );
        Ok(OrderWithItems {
            order: Order {
                is_completed: true,
                ..order
            },
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
        let mut tx = self.pool.begin().await?;
        let batch = Self::fetch_batch_tx(&mut tx, req.batch_id, false)
            .await?
            .ok_or_else(|| CoreError::not_found("Batch not found"))?;
        validate_event_log(&batch, req.actor, req.actor_role, req.kind)?;
        let event = self
            .append_event_tx(
                &mut tx,
                req.kind,
                batch.id,
                batch.product_id,
                req.actor,
                req.location,
                req.note,
                batch.status,
            )
            .await?;
        tx.commit().await?;
        Ok(event)
    }

    async fn add_attachment(
        &self,
        actor: Uuid,
        event_id: Uuid,
        attachment: NewAttachment,
    ) -> StoreResult<EventAttachment> {
        let query = format!("{EVENT_SELECT} WHERE e.id = $1");
        let row: Option<EventRow> = sqlx::query_as(&query)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        let event = row
            .map(EventRow::into_event)
            .transpose()?
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
        sqlx::query(
            r#"INSERT INTO event_attachments (id, event_id, file_name, file_url, content_type, uploaded_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(created.id)
        .bind(created.event_id)
        .bind(&created.file_name)
        .bind(&created.file_url)
        .bind(&created.content_type)
        .bind(created.uploaded_at)
        .execute(&self.pool)
        .await?;
        Ok(created)
    }

    async fn add_device_reading(
        &self,
        actor: Uuid,
        event_id: Uuid,
        reading: NewDeviceReading,
    ) -> StoreResult<DeviceReading> {
        let query = format!("{EVENT_SELECT} WHERE e.id = $1");
        let row: Option<EventRow> = sqlx::query_as(&query)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        let event = row
            .map(EventRow::into_event)
            .transpose()?
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
        sqlx::query(
            r#"INSERT INTO device_raw_data (id, event_id, device_id, payload, captured_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(created.id)
        .bind(created.event_id)
        .bind(&created.device_id)
        .bind(&created.payload)
        .bind(created.captured_at)
        .execute(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_batch(&self, batch_id: Uuid) -> StoreResult<Option<Batch>> {
        let query = format!("{BATCH_SELECT} WHERE b.id = $1");
        let row: Option<BatchRow> = sqlx::query_as(&query)
            .bind(batch_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(BatchRow::into_batch).transpose()
    }

    async fn find_batch_by_code(&self, batch_code: &str) -> StoreResult<Option<Batch>> {
        let query = format!("{BATCH_SELECT} WHERE b.batch_code = $1");
        let row: Option<BatchRow> = sqlx::query_as(&query)
            .bind(batch_code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(BatchRow::into_batch).transpose()
    }

    async fn list_batches_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Batch>> {
        let query = format!("{BATCH_SELECT} WHERE b.current_owner_id = $1 ORDER BY b.created_at DESC");
        let rows: Vec<BatchRow> = sqlx::query_as(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(BatchRow::into_batch).collect()
    }

    async fn list_batches_by_status(&self, status: BatchStatus) -> StoreResult<Vec<Batch>> {
        let query = format!("{BATCH_SELECT} WHERE s.name = $1 ORDER BY b.created_at DESC");
        let rows: Vec<BatchRow> = sqlx::query_as(&query)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(BatchRow::into_batch).collect()
    }

    async fn list_marketplace(&self) -> StoreResult<Vec<MarketListing>> {
        #[derive(sqlx::FromRow)]
        struct MarketRow {
            #[sqlx(flatten)]
            batch: BatchRow,
            product_title: String,
            farmer_name: String,
        }

        let query = r#"SELECT b.id, b.batch_code, b.product_id, b.parent_batch_id, b.current_owner_id,
                      s.name AS status_name, b.initial_quantity, b.remaining_quantity,
                      b.quantity_unit, b.price_per_unit, b.final_price, b.harvest_date, b.created_at,
                      p.title AS product_title, u.username AS farmer_name
                 FROM batches b
                 JOIN statuses s ON s.id = b.current_status_id
                 JOIN products p ON p.id = b.product_id
                 JOIN users u ON u.user_id = p.farmer_id
                WHERE s.name = $1 AND b.remaining_quantity > 0
                ORDER BY b.created_at DESC"#;
        let rows: Vec<MarketRow> = sqlx::query_as(query)
            .bind(BatchStatus::Harvested.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                Ok(MarketListing {
                    batch: row.batch.into_batch()?,
                    product_title: row.product_title,
                    farmer_name: row.farmer_name,
                })
            })
            .collect()
    }

    async fn lineage_bundle(&self, product_id: Uuid) -> StoreResult<LineageBundle> {
        let batch_query = format!("{BATCH_SELECT} WHERE b.product_id = $1");
        let batch_rows: Vec<BatchRow> = sqlx::query_as(&batch_query)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        let batches: Vec<Batch> = batch_rows
            .into_iter()
            .map(BatchRow::into_batch)
            .collect::<StoreResult<_>>()?;
        let batch_ids: Vec<Uuid> = batches.iter().map(|b| b.id).collect();

        let event_query =
            format!("{EVENT_SELECT} WHERE e.batch_id = ANY($1) ORDER BY e.recorded_at ASC");
        let event_rows: Vec<EventRow> = sqlx::query_as(&event_query)
            .bind(&batch_ids)
            .fetch_all(&self.pool)
            .await?;
        let events: Vec<Event> = event_rows
            .into_iter()
            .map(EventRow::into_event)
            .collect::<StoreResult<_>>()?;
        let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();

        let attachment_rows: Vec<AttachmentRow> = sqlx::query_as(
            "SELECT id, event_id, file_name, file_url, content_type, uploaded_at FROM event_attachments WHERE event_id = ANY($1)",
        )
        .bind(&event_ids)
        .fetch_all(&self.pool)
        .await?;
        let reading_rows: Vec<DeviceReadingRow> = sqlx::query_as(
            "SELECT id, event_id, device_id, payload, captured_at FROM device_raw_data WHERE event_id = ANY($1)",
        )
        .bind(&event_ids)
        .fetch_all(&self.pool)
        .await?;

        let actor_ids: Vec<Uuid> = events
            .iter()
            .map(|e| e.actor_user_id)
            .chain(batches.iter().map(|b| b.current_owner_id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let actor_rows: Vec<UserRow> = sqlx::query_as(
            "SELECT user_id, username, password_hash, role, wallet_balance, created_at FROM users WHERE user_id = ANY($1)",
        )
        .bind(&actor_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(LineageBundle {
            batches,
            events,
            attachments: attachment_rows.into_iter().map(Into::into).collect(),
            readings: reading_rows.into_iter().map(Into::into).collect(),
            actors: actor_rows
                .into_iter()
                .map(UserRow::into_actor_ref)
                .collect::<StoreResult<_>>()?,
        })
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<OrderWithItems>> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            r#"SELECT id, order_number, buyer_id, seller_id, total_amount, is_completed, created_at
                 FROM orders
                WHERE buyer_id = $1 OR seller_id = $1
                ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.order_with_items(Order::from(row)).await?);
        }
        Ok(orders)
    }

    async fn get_order(&self, order_id: Uuid) -> StoreResult<Option<OrderWithItems>> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, order_number, buyer_id, seller_id, total_amount, is_completed, created_at FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(self.order_with_items(Order::from(row)).await?)),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl PgStore {
    /// Shared body of the three logistics transitions.
    async fn apply_transition(
        &self,
        actor: Uuid,
        actor_role: Role,
        batch_id: Uuid,
        transition: Transition,
    ) -> StoreResult<Batch> {
        let mut tx = self.pool.begin().await?;
        let batch = Self::fetch_batch_tx(&mut tx, batch_id, true)
            .await?
            .ok_or_else(|| CoreError::not_found("Batch not found"))?;
        let plan = plan_transition(&batch, actor, actor_role, transition)?;

        let status_id = self.taxonomy.status_id(plan.status_after)?;
        sqlx::query(
            "UPDATE batches SET current_status_id = $1, final_price = COALESCE($2, final_price) WHERE id = $3",
        )
        .bind(status_id)
        .bind(plan.final_price)
        .bind(batch.id)
        .execute(&mut *tx)
        .await?;

        if let Some(credit) = plan.credit_actor {
            Self::lock_wallets_tx(&mut tx, &[actor]).await?;
            Self::adjust_wallet_tx(
                &mut tx,
                actor,
                credit,
                WalletReason::RetailSaleProceeds,
                Some(batch.id),
                None,
            )
            .await?;
        }

        self.append_event_tx(
            &mut tx,
            plan.event,
            batch.id,
            batch.product_id,
            actor,
            None,
            None,
            plan.status_after,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            batch_code = %batch.batch_code,
            from = %batch.status,
            to = %plan.status_after,
            "status transition"
        );
        Ok(Batch {
            status: plan.status_after,
            final_price: plan.final_price.or(batch.final_price),
            ..batch
        })
    }
}
