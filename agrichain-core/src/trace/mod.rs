//! Traceability engine
//!
//! Reconstructs the full story of a batch from one bulk fetch of its
//! product's entire lineage: genealogy tree, chronological timeline with
//! attachments and sensor readings, per-role lifecycle stages, and the
//! derived journey summary. Read-only; the walk is iterative and bounded
//! so inconsistent lineage data can never hang it.

pub mod genealogy;
pub mod journey;
pub mod stages;
pub mod story;
pub mod timeline;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Batch, DeviceReading, Event, EventAttachment, Role};

pub use genealogy::{build_genealogy, BatchNode, Genealogy, MAX_LINEAGE_DEPTH};
pub use journey::journey_summary;
pub use stages::{group_stages, LifecycleStage, StageGroups};
pub use story::{assemble_story, BatchSummary, StorySummary, TraceStory};
pub use timeline::{build_timeline, TimelineEntry};

/// Resolved user shown on a timeline entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRef {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Everything the store fetches for one product's lineage. Events may
/// reference actors missing from `actors` (deleted users); the timeline
/// leaves those unresolved rather than failing.
#[derive(Debug, Clone, Default)]
pub struct LineageBundle {
    pub batches: Vec<Batch>,
    pub events: Vec<Event>,
    pub attachments: Vec<EventAttachment>,
    pub readings: Vec<DeviceReading>,
    pub actors: Vec<ActorRef>,
}
