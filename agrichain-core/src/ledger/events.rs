//! Event-log validation
//!
//! Direct event logging is limited to the lifecycle kinds a role is
//! allowed to record; ledger-generated kinds only ever come from ledger
//! operations. Farmers log field events against batches they own;
//! transporters log waypoints against batches on the road.

use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Batch, BatchStatus, EventKind, Role};

/// Validate a direct event-log request against the target batch.
pub fn validate_event_log(
    batch: &Batch,
    actor: Uuid,
    actor_role: Role,
    kind: EventKind,
) -> CoreResult<()> {
    match kind.loggable_by() {
        None => Err(CoreError::validation(format!(
            "Event type {kind} is recorded by ledger operations and cannot be logged directly"
        ))),
        Some(role) if role != actor_role => Err(CoreError::forbidden(format!(
            "Role {actor_role} cannot log {kind} events"
        ))),
        // Transport waypoints attach to batches currently on the road
        Some(Role::Transporter) => {
            if batch.status != BatchStatus::InTransit {
                return Err(CoreError::InvalidStatus {
                    batch_code: batch.batch_code.clone(),
                    actual: batch.status,
                    expected: BatchStatus::InTransit.as_str().to_string(),
                });
            }
            Ok(())
        }
        // Field events require ownership
        Some(_) => {
            if batch.current_owner_id != actor {
                return Err(CoreError::forbidden("You do not own this batch"));
            }
            Ok(())
        }
    }
}
