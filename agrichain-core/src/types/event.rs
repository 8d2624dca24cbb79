//! Lifecycle events and their child records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::{BatchStatus, Role};

/// Event taxonomy. Ledger-generated kinds (`Harvest`, `Split`, `Sold`,
/// `RetailSale`) are emitted only by ledger operations; the rest can be
/// logged directly by the role listed in [`EventKind::loggable_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Harvest,
    #[serde(rename = "Harvest Log")]
    HarvestLog,
    #[serde(rename = "Fertilizer Applied")]
    FertilizerApplied,
    #[serde(rename = "Pesticide Applied")]
    PesticideApplied,
    Irrigation,
    #[serde(rename = "Quality Check")]
    QualityCheck,
    Split,
    Sold,
    #[serde(rename = "Transport Start")]
    TransportStart,
    #[serde(rename = "Transport End")]
    TransportEnd,
    #[serde(rename = "Retail Sale")]
    RetailSale,
}

impl EventKind {
    /// All taxonomy entries, in seed order
    pub const ALL: [EventKind; 11] = [
        EventKind::Harvest,
        EventKind::HarvestLog,
        EventKind::FertilizerApplied,
        EventKind::PesticideApplied,
        EventKind::Irrigation,
        EventKind::QualityCheck,
        EventKind::Split,
        EventKind::Sold,
        EventKind::TransportStart,
        EventKind::TransportEnd,
        EventKind::RetailSale,
    ];

    /// Canonical taxonomy name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Harvest => "Harvest",
            EventKind::HarvestLog => "Harvest Log",
            EventKind::FertilizerApplied => "Fertilizer Applied",
            EventKind::PesticideApplied => "Pesticide Applied",
            EventKind::Irrigation => "Irrigation",
            EventKind::QualityCheck => "Quality Check",
            EventKind::Split => "Split",
            EventKind::Sold => "Sold",
            EventKind::TransportStart => "Transport Start",
            EventKind::TransportEnd => "Transport End",
            EventKind::RetailSale => "Retail Sale",
        }
    }

    /// Parse a taxonomy name
    pub fn parse(s: &str) -> Option<EventKind> {
        EventKind::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// Which role may log this kind directly, if any. Ledger-generated
    /// kinds return `None` and are rejected on the event-logging path.
    pub fn loggable_by(&self) -> Option<Role> {
        match self {
            EventKind::HarvestLog
            | EventKind::FertilizerApplied
            | EventKind::PesticideApplied
            | EventKind::Irrigation
            | EventKind::QualityCheck => Some(Role::Farmer),
            EventKind::TransportStart | EventKind::TransportEnd => Some(Role::Transporter),
            EventKind::Harvest | EventKind::Split | EventKind::Sold | EventKind::RetailSale => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geolocation attached to an event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Immutable record of something that happened to a batch. Created once,
/// never mutated; attachments and readings are appended separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub kind: EventKind,
    pub batch_id: Uuid,
    pub actor_user_id: Uuid,
    pub location: Option<GeoPoint>,
    pub note: Option<String>,
    /// External distributed-ledger reference, if mirrored
    pub ledger_ref: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// File evidence appended to an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttachment {
    pub id: Uuid,
    pub event_id: Uuid,
    pub file_name: String,
    pub file_url: Option<String>,
    pub content_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Raw sensor payload appended to an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReading {
    pub id: Uuid,
    pub event_id: Uuid,
    pub device_id: String,
    pub payload: Value,
    pub captured_at: DateTime<Utc>,
}

/// Denormalized query-acceleration row joining product, batch, event and
/// the batch status at event time. Written once per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainLogEntry {
    pub log_id: Uuid,
    pub product_id: Uuid,
    pub batch_id: Uuid,
    pub event_id: Uuid,
    pub status_at_time: BatchStatus,
    pub logged_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn ledger_generated_kinds_are_not_loggable() {
        assert_eq!(EventKind::Harvest.loggable_by(), None);
        assert_eq!(EventKind::Split.loggable_by(), None);
        assert_eq!(EventKind::Sold.loggable_by(), None);
        assert_eq!(EventKind::RetailSale.loggable_by(), None);
        assert_eq!(EventKind::Irrigation.loggable_by(), Some(Role::Farmer));
        assert_eq!(
            EventKind::TransportStart.loggable_by(),
            Some(Role::Transporter)
        );
    }
}
