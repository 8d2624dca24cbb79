//! Product templates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named crop template owned by a farmer. Batches reference a product;
/// the product itself never changes hands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub title: String,
    /// Free-text crop details (variety, soil, irrigation, ...)
    pub crop_details: Option<String>,
    pub created_at: DateTime<Utc>,
}
