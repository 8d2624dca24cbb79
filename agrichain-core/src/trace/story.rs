//! Story assembly
//!
//! Puts the whole trace together: batch summary, genealogy, timeline,
//! stage groups and the derived journey.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{BatchStatus, Product};

use super::{
    build_genealogy, build_timeline, group_stages, journey_summary, ActorRef, Genealogy,
    LineageBundle, StageGroups, TimelineEntry,
};

/// Snapshot of the scanned batch shown at the top of the story
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub id: Uuid,
    pub batch_code: String,
    pub product: Option<Product>,
    pub current_owner: Option<ActorRef>,
    pub current_status: BatchStatus,
    pub initial_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub quantity_unit: String,
    pub harvest_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Derived closing block of the story
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySummary {
    pub total_events: usize,
    pub origin: String,
    pub journey: Vec<String>,
}

/// The full aggregate a trace lookup returns (before external ledger
/// enrichment, which the API layer merges in)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStory {
    pub batch: BatchSummary,
    pub genealogy: Genealogy,
    pub timeline: Vec<TimelineEntry>,
    pub stages: StageGroups,
    pub summary: StorySummary,
}

/// Assemble the story for `scanned_id` from its product's lineage bundle.
pub fn assemble_story(
    product: Option<Product>,
    bundle: &LineageBundle,
    scanned_id: Uuid,
) -> CoreResult<TraceStory> {
    let scanned = bundle
        .batches
        .iter()
        .find(|b| b.id == scanned_id)
        .ok_or_else(|| CoreError::not_found("Batch not found"))?
        .clone();

    let genealogy = build_genealogy(&bundle.batches, scanned_id)?;
    let timeline = build_timeline(bundle);
    let stages = group_stages(&timeline);
    let journey = journey_summary(timeline.iter().map(|e| e.event_type));

    let origin = if scanned.is_root() {
        "Harvested from farm"
    } else {
        "Split from parent batch"
    };

    let current_owner = bundle
        .actors
        .iter()
        .find(|a| a.user_id == scanned.current_owner_id)
        .cloned();

    Ok(TraceStory {
        batch: BatchSummary {
            id: scanned.id,
            batch_code: scanned.batch_code,
            product,
            current_owner,
            current_status: scanned.status,
            initial_quantity: scanned.initial_quantity,
            remaining_quantity: scanned.remaining_quantity,
            quantity_unit: scanned.quantity_unit,
            harvest_date: scanned.harvest_date,
            created_at: scanned.created_at,
        },
        genealogy,
        timeline,
        summary: StorySummary {
            total_events: stages.farmer.len()
                + stages.distributor.len()
                + stages.transporter.len()
                + stages.retailer.len(),
            origin: origin.to_string(),
            journey,
        },
        stages,
    })
}
