//! AgriChain Command Line Interface
//!
//! Usage:
//!   agrichain init            - Initialize database schema and taxonomy
//!   agrichain seed            - Seed demo users
//!   agrichain serve           - Start the API server
//!
//! Without `DATABASE_URL` the server runs against the in-memory demo
//! store; state is lost on exit.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use agrichain_api::{run_server, ApiConfig, JwtConfig};
use agrichain_store::{ChainStore, MemStore, PgStore};

mod seed;

#[derive(Parser)]
#[command(name = "agrichain")]
#[command(about = "AgriChain supply-chain ledger CLI")]
#[command(version)]
struct Cli {
    /// PostgreSQL connection string; uses the in-memory demo store when
    /// omitted
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema and taxonomy
    Init,

    /// Seed the demo users (farmer_joe, distributor_dave, ...)
    Seed,

    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = agrichain_api::DEFAULT_PORT)]
        port: u16,
        /// JWT signing secret (at least 32 bytes)
        #[arg(long, env = "AGRICHAIN_JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
        /// Base URL of the read-only distributed-ledger mirror
        #[arg(long, env = "AGRICHAIN_MIRROR_URL")]
        mirror_url: Option<String>,
        /// Disable permissive CORS
        #[arg(long)]
        no_cors: bool,
    },
}

async fn build_store(
    database_url: Option<&str>,
) -> Result<Arc<dyn ChainStore>, Box<dyn std::error::Error + Send + Sync>> {
    match database_url {
        Some(url) => {
            let store = PgStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory demo store");
            Ok(Arc::new(MemStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init => {
            let url = cli.database_url.ok_or("init requires DATABASE_URL")?;
            PgStore::connect(&url).await?;
            tracing::info!("database schema and taxonomy initialized");
        }
        Commands::Seed => {
            let store = build_store(cli.database_url.as_deref()).await?;
            seed::seed_demo_users(store.as_ref()).await?;
        }
        Commands::Serve {
            host,
            port,
            jwt_secret,
            mirror_url,
            no_cors,
        } => {
            let store = build_store(cli.database_url.as_deref()).await?;
            let jwt = JwtConfig::try_new(jwt_secret).map_err(|e| e.to_string())?;
            let config = ApiConfig {
                host,
                port,
                enable_cors: !no_cors,
                mirror_base_url: mirror_url,
            };
            run_server(&config, store, jwt).await?;
        }
    }
    Ok(())
}
