//! Batch ledger planners
//!
//! Pure validation/planning for every state-changing operation. A store
//! backend acquires its row locks, fetches a consistent snapshot, hands
//! it to the planner, and applies the returned plan inside the same
//! transaction. Planners never touch storage, which keeps the
//! transactional decision logic in one place and unit-testable.

pub mod events;
pub mod harvest;
pub mod logistics;
pub mod order;
pub mod purchase;
pub mod split;

pub use events::validate_event_log;
pub use harvest::{plan_harvest, HarvestPlan, HarvestRequest};
pub use logistics::{plan_transition, Transition, TransitionPlan};
pub use order::{plan_order, OrderItemRequest, OrderPlan, PlannedOrderItem};
pub use purchase::{plan_purchase, PurchasePlan, DEFAULT_PRICE_PER_UNIT};
pub use split::{plan_split, PlannedChild, SplitPlan, SplitRequest};
