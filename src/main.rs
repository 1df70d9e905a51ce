//! upkeep-server - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the task list API and the
//! WebSocket change feed.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upkeep::{api, config::Config, FileStore, MemoryStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upkeep=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Pick the storage backend: a JSON-file store when a path is configured,
    // otherwise everything lives in memory for the lifetime of the process.
    let store: Arc<dyn Store> = match &config.storage_path {
        Some(path) => {
            info!("Using FileStore with storage path: {}", path.display());
            Arc::new(FileStore::open(path.clone()).await?)
        }
        None => {
            info!("Using MemoryStore (no storage path set)");
            Arc::new(MemoryStore::new())
        }
    };

    // Start HTTP server
    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting server on {}", addr);

    api::serve(config, store).await?;

    Ok(())
}
