//! AgriChain REST API
//!
//! HTTP layer over the chain store.
//!
//! # Endpoints
//!
//! ## Health
//! - `GET /health` - Health check (store ping)
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//!
//! ## Auth
//! - `POST /api/auth/register` - Create an account
//! - `POST /api/auth/login` - Issue a bearer token
//!
//! ## Farmer (role FARMER)
//! - `POST /api/farmer/products` / `GET /api/farmer/products`
//! - `POST /api/farmer/batches` / `GET /api/farmer/batches`
//! - `POST /api/farmer/events` - Log a field event
//!
//! ## Distributor (role DISTRIBUTOR)
//! - `GET /api/distributor/marketplace`
//! - `POST /api/distributor/buy`
//! - `POST /api/distributor/split-batch`
//! - `GET /api/distributor/inventory`
//! - `POST /api/distributor/ship`
//!
//! ## Transporter (role TRANSPORTER)
//! - `GET /api/transporter/jobs`
//! - `POST /api/transporter/deliver`
//! - `POST /api/transporter/events`
//! - `POST /api/transporter/events/:event_id/attachments`
//! - `POST /api/transporter/events/:event_id/device-data`
//!
//! ## Shop (role SHOPKEEPER)
//! - `GET /api/shop/inventory`
//! - `POST /api/shop/sell`
//!
//! ## Commerce (any authenticated user)
//! - `POST /api/commerce/orders`
//! - `GET /api/commerce/orders`
//! - `GET /api/commerce/orders/:order_id`
//!
//! ## Traceability (public)
//! - `GET /api/traceability/batch/:batch_code`
//! - `GET /api/traceability/batch/:batch_code/genealogy`
//! - `GET /api/traceability/batch/:batch_code/events`
//! - `GET /api/traceability/product/:product_id/blockchain`
//!
//! Every response uses the `{success, message, data?, error?}` envelope.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod mirror;
pub mod router;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResponse, ApiResult};
pub use middleware::{AuthClaims, JwtConfig};
pub use mirror::{MirrorClient, MirrorConfig, MirrorTransaction};
pub use router::create_router;
pub use server::{create_server, run_server, start_background_server};
pub use state::{ApiConfig, AppState};

/// API version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default port
pub const DEFAULT_PORT: u16 = 5000;
