//! API Router
//!
//! Route definitions. Role-gated routers layer the role gate on top of
//! the bearer-token middleware; traceability stays public so a consumer
//! can scan a QR code without an account.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::middleware::{
    auth_middleware, require_distributor, require_farmer, require_shopkeeper, require_transporter,
};
use crate::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let farmer = Router::new()
        .route(
            "/products",
            post(handlers::farmer::create_product).get(handlers::farmer::list_products),
        )
        .route(
            "/batches",
            post(handlers::farmer::create_batch).get(handlers::farmer::my_batches),
        )
        .route("/events", post(handlers::farmer::log_event))
        .layer(from_fn(require_farmer))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let distributor = Router::new()
        .route("/marketplace", get(handlers::distributor::marketplace))
        .route("/buy", post(handlers::distributor::buy))
        .route("/split-batch", post(handlers::distributor::split_batch))
        .route("/inventory", get(handlers::distributor::inventory))
        .route("/ship", post(handlers::distributor::ship))
        .layer(from_fn(require_distributor))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let transporter = Router::new()
        .route("/jobs", get(handlers::logistics::transport_jobs))
        .route("/deliver", post(handlers::logistics::deliver))
        .route("/events", post(handlers::logistics::log_transport_event))
        .route(
            "/events/:event_id/attachments",
            post(handlers::logistics::add_attachment),
        )
        .route(
            "/events/:event_id/device-data",
            post(handlers::logistics::add_device_data),
        )
        .layer(from_fn(require_transporter))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let shop = Router::new()
        .route("/inventory", get(handlers::logistics::shop_inventory))
        .route("/sell", post(handlers::logistics::sell_to_consumer))
        .layer(from_fn(require_shopkeeper))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let commerce = Router::new()
        .route(
            "/orders",
            post(handlers::commerce::create_order).get(handlers::commerce::my_orders),
        )
        .route("/orders/:order_id", get(handlers::commerce::order_by_id))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let traceability = Router::new()
        .route("/batch/:batch_code", get(handlers::traceability::trace_batch))
        .route(
            "/batch/:batch_code/genealogy",
            get(handlers::traceability::genealogy),
        )
        .route(
            "/batch/:batch_code/events",
            get(handlers::traceability::batch_events),
        )
        .route(
            "/product/:product_id/blockchain",
            get(handlers::traceability::product_blockchain),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .nest("/api/auth", auth)
        .nest("/api/farmer", farmer)
        .nest("/api/distributor", distributor)
        .nest("/api/transporter", transporter)
        .nest("/api/shop", shop)
        .nest("/api/commerce", commerce)
        .nest("/api/traceability", traceability)
        .with_state(state)
}
