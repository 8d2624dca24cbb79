//! Lifecycle stage grouping
//!
//! Buckets timeline entries by the role that acted. When the actor's
//! role is unknown or not classifiable, a static event-type fallback
//! table decides, so extending the taxonomy never touches the grouping
//! logic.

use serde::{Deserialize, Serialize};

use crate::types::{EventKind, Role};

use super::TimelineEntry;

/// Supply-chain stage a timeline entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Farmer,
    Distributor,
    Transporter,
    Retailer,
}

/// Event-type fallback when the actor role cannot classify the entry
const STAGE_FALLBACK: &[(EventKind, LifecycleStage)] = &[
    (EventKind::Harvest, LifecycleStage::Farmer),
    (EventKind::HarvestLog, LifecycleStage::Farmer),
    (EventKind::FertilizerApplied, LifecycleStage::Farmer),
    (EventKind::PesticideApplied, LifecycleStage::Farmer),
    (EventKind::Irrigation, LifecycleStage::Farmer),
    (EventKind::Split, LifecycleStage::Distributor),
    (EventKind::Sold, LifecycleStage::Distributor),
    (EventKind::TransportStart, LifecycleStage::Transporter),
    (EventKind::TransportEnd, LifecycleStage::Transporter),
    (EventKind::QualityCheck, LifecycleStage::Retailer),
    (EventKind::RetailSale, LifecycleStage::Retailer),
];

/// Stage for one entry: actor role first, event-type fallback second.
pub fn classify(role: Option<Role>, kind: EventKind) -> LifecycleStage {
    match role {
        Some(Role::Farmer) => LifecycleStage::Farmer,
        Some(Role::Distributor) => LifecycleStage::Distributor,
        Some(Role::Transporter) => LifecycleStage::Transporter,
        Some(Role::Shopkeeper) => LifecycleStage::Retailer,
        Some(Role::Consumer) | None => STAGE_FALLBACK
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, stage)| *stage)
            .unwrap_or(LifecycleStage::Farmer),
    }
}

/// Timeline entries grouped per stage, original order preserved
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageGroups {
    pub farmer: Vec<TimelineEntry>,
    pub distributor: Vec<TimelineEntry>,
    pub transporter: Vec<TimelineEntry>,
    pub retailer: Vec<TimelineEntry>,
}

/// Group a timeline into per-role buckets.
pub fn group_stages(timeline: &[TimelineEntry]) -> StageGroups {
    let mut groups = StageGroups::default();
    for entry in timeline {
        let stage = classify(entry.actor.as_ref().map(|a| a.role), entry.event_type);
        let bucket = match stage {
            LifecycleStage::Farmer => &mut groups.farmer,
            LifecycleStage::Distributor => &mut groups.distributor,
            LifecycleStage::Transporter => &mut groups.transporter,
            LifecycleStage::Retailer => &mut groups.retailer,
        };
        bucket.push(entry.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_role_wins_over_fallback() {
        // A distributor running a quality check stays in the distributor bucket
        assert_eq!(
            classify(Some(Role::Distributor), EventKind::QualityCheck),
            LifecycleStage::Distributor
        );
        assert_eq!(
            classify(Some(Role::Shopkeeper), EventKind::Sold),
            LifecycleStage::Retailer
        );
    }

    #[test]
    fn unknown_actor_falls_back_to_event_type() {
        assert_eq!(
            classify(None, EventKind::TransportStart),
            LifecycleStage::Transporter
        );
        assert_eq!(classify(None, EventKind::Split), LifecycleStage::Distributor);
        assert_eq!(
            classify(Some(Role::Consumer), EventKind::Harvest),
            LifecycleStage::Farmer
        );
    }
}
