//! Domain types

mod batch;
mod event;
mod order;
mod product;
mod user;

pub use batch::{Batch, BatchStatus};
pub use event::{ChainLogEntry, DeviceReading, Event, EventAttachment, EventKind, GeoPoint};
pub use order::{Order, OrderItem, OrderWithItems, WalletEntry, WalletReason};
pub use product::Product;
pub use user::{Role, User};
