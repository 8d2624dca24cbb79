//! AgriChain Core
//!
//! Domain model for the AgriChain supply-chain ledger: users, products,
//! batches with split lineage, immutable lifecycle events, and orders.
//!
//! The transactional decision logic lives here as pure planners
//! (`ledger` module): a store backend locks the rows it needs, hands the
//! snapshot to a planner, and applies the returned write plan inside the
//! same transaction. Both storage backends execute identical semantics.
//!
//! The traceability engine (`trace` module) reconstructs a batch's full
//! story from one bulk lineage fetch: genealogy tree, chronological
//! timeline, per-role lifecycle stages, and the derived journey summary.

pub mod batch_code;
pub mod error;
pub mod ledger;
pub mod trace;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{
    Batch, BatchStatus, ChainLogEntry, DeviceReading, Event, EventAttachment, EventKind, GeoPoint,
    Order, OrderItem, OrderWithItems, Product, Role, User, WalletEntry, WalletReason,
};
