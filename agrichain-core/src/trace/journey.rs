//! Journey summary
//!
//! Derives the human-readable milestone list from which event types
//! appear anywhere in the timeline. Data-driven so the taxonomy can grow
//! without touching traversal logic.

use std::collections::HashSet;

use crate::types::EventKind;

/// Ordered milestone checklist: phrase included once when its event type
/// appears in the timeline.
const MILESTONES: &[(EventKind, &str)] = &[
    (EventKind::Harvest, "Harvested from farm"),
    (EventKind::FertilizerApplied, "Fertilizer applied"),
    (EventKind::PesticideApplied, "Pesticide applied"),
    (EventKind::Irrigation, "Irrigated"),
    (EventKind::TransportStart, "Transported"),
    (EventKind::QualityCheck, "Quality checked"),
    (EventKind::Split, "Split into smaller batches"),
    (EventKind::Sold, "Sold"),
];

const FALLBACK_PHRASE: &str = "Product journey tracked";

/// Milestone phrases for the event kinds present in a timeline.
pub fn journey_summary<I>(kinds: I) -> Vec<String>
where
    I: IntoIterator<Item = EventKind>,
{
    let present: HashSet<EventKind> = kinds.into_iter().collect();
    let journey: Vec<String> = MILESTONES
        .iter()
        .filter(|(kind, _)| present.contains(kind))
        .map(|(_, phrase)| phrase.to_string())
        .collect();
    if journey.is_empty() {
        vec![FALLBACK_PHRASE.to_string()]
    } else {
        journey
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestones_follow_checklist_order() {
        let journey = journey_summary([
            EventKind::Sold,
            EventKind::Harvest,
            EventKind::Split,
            EventKind::Harvest,
        ]);
        assert_eq!(
            journey,
            vec!["Harvested from farm", "Split into smaller batches", "Sold"]
        );
    }

    #[test]
    fn unmatched_timeline_gets_the_generic_phrase() {
        let journey = journey_summary([EventKind::HarvestLog, EventKind::TransportEnd]);
        assert_eq!(journey, vec![FALLBACK_PHRASE]);

        let journey = journey_summary([]);
        assert_eq!(journey, vec![FALLBACK_PHRASE]);
    }
}
