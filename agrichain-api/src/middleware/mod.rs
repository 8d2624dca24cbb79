//! Request middleware: JWT authentication and role gates

pub mod auth;
pub mod role;

pub use auth::{auth_middleware, issue_token, AuthClaims, JwtConfig};
pub use role::{require_distributor, require_farmer, require_shopkeeper, require_transporter};
