//! Timeline assembly
//!
//! Merges every event across the product lineage into one chronological
//! list, each entry enriched with its attachments, device readings, the
//! batch code it happened on and the resolved actor.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{DeviceReading, EventAttachment, EventKind, GeoPoint};

use super::{ActorRef, LineageBundle};

/// One enriched event on the product timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: Uuid,
    pub event_type: EventKind,
    pub batch_id: Uuid,
    pub batch_code: String,
    pub recorded_at: DateTime<Utc>,
    pub actor: Option<ActorRef>,
    pub location: Option<GeoPoint>,
    pub note: Option<String>,
    pub ledger_ref: Option<String>,
    pub attachments: Vec<EventAttachment>,
    pub device_readings: Vec<DeviceReading>,
}

/// Build the chronological timeline (recorded-at ascending, event id as
/// the tie-breaker so the order is stable).
pub fn build_timeline(bundle: &LineageBundle) -> Vec<TimelineEntry> {
    let batch_codes: HashMap<Uuid, &str> = bundle
        .batches
        .iter()
        .map(|b| (b.id, b.batch_code.as_str()))
        .collect();
    let actors: HashMap<Uuid, &ActorRef> =
        bundle.actors.iter().map(|a| (a.user_id, a)).collect();

    let mut attachments_of: HashMap<Uuid, Vec<EventAttachment>> = HashMap::new();
    for attachment in &bundle.attachments {
        attachments_of
            .entry(attachment.event_id)
            .or_default()
            .push(attachment.clone());
    }
    let mut readings_of: HashMap<Uuid, Vec<DeviceReading>> = HashMap::new();
    for reading in &bundle.readings {
        readings_of
            .entry(reading.event_id)
            .or_default()
            .push(reading.clone());
    }

    let mut timeline: Vec<TimelineEntry> = bundle
        .events
        .iter()
        .map(|event| TimelineEntry {
            id: event.id,
            event_type: event.kind,
            batch_id: event.batch_id,
            batch_code: batch_codes
                .get(&event.batch_id)
                .map(|c| c.to_string())
                .unwrap_or_default(),
            recorded_at: event.recorded_at,
            actor: actors.get(&event.actor_user_id).map(|a| (*a).clone()),
            location: event.location,
            note: event.note.clone(),
            ledger_ref: event.ledger_ref.clone(),
            attachments: attachments_of.remove(&event.id).unwrap_or_default(),
            device_readings: readings_of.remove(&event.id).unwrap_or_default(),
        })
        .collect();
    timeline.sort_by(|a, b| {
        a.recorded_at
            .cmp(&b.recorded_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    timeline
}
