//! API Server setup

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use agrichain_store::ChainStore;

use crate::middleware::JwtConfig;
use crate::mirror::{MirrorClient, MirrorConfig};
use crate::router::create_router;
use crate::state::{ApiConfig, AppState};

/// Create the API server router and address
pub fn create_server(
    config: &ApiConfig,
    store: Arc<dyn ChainStore>,
    jwt: JwtConfig,
) -> Result<(Router, SocketAddr), Box<dyn std::error::Error + Send + Sync>> {
    let mirror = match &config.mirror_base_url {
        Some(base_url) => Some(MirrorClient::new(MirrorConfig::new(base_url.clone()))?),
        None => None,
    };
    let state = AppState::new(store, jwt, mirror);

    let mut router = create_router(state);
    router = router.layer(TraceLayer::new_for_http());
    if config.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    Ok((router, addr))
}

/// Run the API server until shutdown
pub async fn run_server(
    config: &ApiConfig,
    store: Arc<dyn ChainStore>,
    jwt: JwtConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (router, addr) = create_server(config, store, jwt)?;

    tracing::info!("AgriChain API server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// Start the server in the background and return its actual address
/// (useful when the configured port is 0).
pub async fn start_background_server(
    config: &ApiConfig,
    store: Arc<dyn ChainStore>,
    jwt: JwtConfig,
) -> Result<SocketAddr, Box<dyn std::error::Error + Send + Sync>> {
    let (router, addr) = create_server(config, store, jwt)?;

    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("Server error: {}", e);
        }
    });
    Ok(actual_addr)
}
