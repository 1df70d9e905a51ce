//! Router assembly and shared application state.

use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::events::{self, ChangeFeed};
use super::{lists, tasks};
use crate::config::Config;
use crate::storage::Store;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Task and list storage
    pub store: Arc<dyn Store>,
    /// Broadcast hub for the WebSocket change feed
    pub events: ChangeFeed,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(events::change_feed_ws))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/:id/snooze", patch(tasks::snooze_task))
        .route("/lists", get(lists::list_lists).post(lists::create_list))
        .route(
            "/lists/:id",
            get(lists::get_list)
                .patch(lists::rename_list)
                .delete(lists::delete_list),
        )
        // Frontend dev servers connect cross-origin.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config, store: Arc<dyn Store>) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        events: ChangeFeed::new(),
    });

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install signal handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
