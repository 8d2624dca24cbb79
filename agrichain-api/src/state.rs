//! Application state

use std::sync::Arc;

use agrichain_store::ChainStore;

use crate::middleware::JwtConfig;
use crate::mirror::MirrorClient;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    /// Base URL of the read-only distributed-ledger mirror, if any
    pub mirror_base_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_PORT,
            enable_cors: true,
            mirror_base_url: None,
        }
    }
}

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn ChainStore>,
    /// Token signing/validation config
    pub jwt: Arc<JwtConfig>,
    /// Optional external ledger mirror (trace enrichment only)
    pub mirror: Option<Arc<MirrorClient>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ChainStore>, jwt: JwtConfig, mirror: Option<MirrorClient>) -> Self {
        Self {
            store,
            jwt: Arc::new(jwt),
            mirror: mirror.map(Arc::new),
        }
    }
}
