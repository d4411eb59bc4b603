//! Application builder and server runner.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use viewer_core::config::AppConfig;
use viewer_core::error::AppError;
use viewer_core::result::AppResult;
use viewer_core::traits::{AssetSource, Simulation};
use viewer_realtime::RealtimeEngine;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Runs the viewer server until Ctrl+C or SIGTERM.
///
/// On shutdown the connection hub is stopped first, so every open socket
/// receives a close frame before the listener drains.
pub async fn run_server(
    config: AppConfig,
    simulation: Arc<dyn Simulation>,
    assets: Arc<dyn AssetSource>,
) -> AppResult<()> {
    let config = Arc::new(config);
    let realtime = Arc::new(RealtimeEngine::start(config.realtime.clone(), simulation));

    let state = AppState::new(config.clone(), realtime.clone(), assets);
    let app = build_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!("Viewer server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            realtime.shutdown().await;
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    info!("Viewer server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
