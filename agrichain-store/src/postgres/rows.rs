//! Row types and conversions
//!
//! sqlx rows carry taxonomy names joined in from the reference tables;
//! conversion into domain types parses them, surfacing unknown names as
//! configuration errors instead of defaulting.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use agrichain_core::trace::ActorRef;
use agrichain_core::types::{
    Batch, BatchStatus, DeviceReading, Event, EventAttachment, EventKind, GeoPoint, Order,
    OrderItem, Product, Role, User,
};
use agrichain_core::CoreError;

use crate::error::{StoreError, StoreResult};

/// Shared SELECT for batches with the status name joined in
pub const BATCH_SELECT: &str = r#"
SELECT b.id, b.batch_code, b.product_id, b.parent_batch_id, b.current_owner_id,
       s.name AS status_name, b.initial_quantity, b.remaining_quantity,
       b.quantity_unit, b.price_per_unit, b.final_price, b.harvest_date, b.created_at
  FROM batches b
  JOIN statuses s ON s.id = b.current_status_id
"#;

/// Shared SELECT for events with the event type name joined in
pub const EVENT_SELECT: &str = r#"
SELECT e.id, t.name AS event_type_name, e.batch_id, e.actor_user_id,
       e.location_lat, e.location_lon, e.note, e.ledger_ref, e.recorded_at
  FROM events e
  JOIN event_types t ON t.id = e.event_type_id
"#;

#[derive(Debug, FromRow)]
pub struct BatchRow {
    pub id: Uuid,
    pub batch_code: String,
    pub product_id: Uuid,
    pub parent_batch_id: Option<Uuid>,
    pub current_owner_id: Uuid,
    pub status_name: String,
    pub initial_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub quantity_unit: String,
    pub price_per_unit: Option<Decimal>,
    pub final_price: Option<Decimal>,
    pub harvest_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl BatchRow {
    pub fn into_batch(self) -> StoreResult<Batch> {
        let status = BatchStatus::parse(&self.status_name).ok_or_else(|| {
            StoreError::Domain(CoreError::Config(format!(
                "unknown status '{}'",
                self.status_name
            )))
        })?;
        Ok(Batch {
            id: self.id,
            batch_code: self.batch_code,
            product_id: self.product_id,
            parent_batch_id: self.parent_batch_id,
            current_owner_id: self.current_owner_id,
            status,
            initial_quantity: self.initial_quantity,
            remaining_quantity: self.remaining_quantity,
            quantity_unit: self.quantity_unit,
            price_per_unit: self.price_per_unit,
            final_price: self.final_price,
            harvest_date: self.harvest_date,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub event_type_name: String,
    pub batch_id: Uuid,
    pub actor_user_id: Uuid,
    pub location_lat: Option<f64>,
    pub location_lon: Option<f64>,
    pub note: Option<String>,
    pub ledger_ref: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl EventRow {
    pub fn into_event(self) -> StoreResult<Event> {
        let kind = EventKind::parse(&self.event_type_name).ok_or_else(|| {
            StoreError::Domain(CoreError::Config(format!(
                "unknown event type '{}'",
                self.event_type_name
            )))
        })?;
        let location = match (self.location_lat, self.location_lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
            _ => None,
        };
        Ok(Event {
            id: self.id,
            kind,
            batch_id: self.batch_id,
            actor_user_id: self.actor_user_id,
            location,
            note: self.note,
            ledger_ref: self.ledger_ref,
            recorded_at: self.recorded_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub wallet_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_user(self) -> StoreResult<User> {
        let role = Role::parse(&self.role).ok_or_else(|| {
            StoreError::Domain(CoreError::Config(format!("unknown role '{}'", self.role)))
        })?;
        Ok(User {
            user_id: self.user_id,
            username: self.username,
            password_hash: self.password_hash,
            role,
            wallet_balance: self.wallet_balance,
            created_at: self.created_at,
        })
    }

    pub fn into_actor_ref(self) -> StoreResult<ActorRef> {
        let user = self.into_user()?;
        Ok(ActorRef {
            user_id: user.user_id,
            username: user.username,
            role: user.role,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub title: String,
    pub crop_details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            farmer_id: row.farmer_id,
            title: row.title,
            crop_details: row.crop_details,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub total_amount: Decimal,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            order_number: row.order_number,
            buyer_id: row.buyer_id,
            seller_id: row.seller_id,
            total_amount: row.total_amount,
            is_completed: row.is_completed,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            batch_id: row.batch_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct AttachmentRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub file_name: String,
    pub file_url: Option<String>,
    pub content_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<AttachmentRow> for EventAttachment {
    fn from(row: AttachmentRow) -> Self {
        EventAttachment {
            id: row.id,
            event_id: row.event_id,
            file_name: row.file_name,
            file_url: row.file_url,
            content_type: row.content_type,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DeviceReadingRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub device_id: String,
    pub payload: Value,
    pub captured_at: DateTime<Utc>,
}

impl From<DeviceReadingRow> for DeviceReading {
    fn from(row: DeviceReadingRow) -> Self {
        DeviceReading {
            id: row.id,
            event_id: row.event_id,
            device_id: row.device_id,
            payload: row.payload,
            captured_at: row.captured_at,
        }
    }
}
