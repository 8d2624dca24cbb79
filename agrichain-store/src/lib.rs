//! AgriChain persistence layer
//!
//! Defines the [`ChainStore`] seam and two backends:
//!
//! - [`PgStore`] - PostgreSQL via sqlx. Every mutation runs as one
//!   transaction with `SELECT ... FOR UPDATE` row locks on the batch and
//!   wallet rows it touches.
//! - [`MemStore`] - in-memory, mutex-serialized. Used by tests and the
//!   demo mode; executes the same core planners as the Postgres backend,
//!   so both implement identical semantics.
//!
//! Backends are replaceable behind the trait; the API layer only ever
//! sees `Arc<dyn ChainStore>`.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemStore;
pub use postgres::PgStore;
pub use traits::{
    ChainStore, MarketListing, NewAttachment, NewDeviceReading, NewUser, PurchaseOutcome,
    RecordEventRequest, SplitOutcome,
};
