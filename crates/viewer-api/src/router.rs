//! Route definitions for the viewer HTTP surface.

use axum::{Router, middleware as axum_middleware, routing::get};
use tower_http::services::ServeDir;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with every route and the request logger.
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .route("/", get(handlers::index::index))
        .route("/asset/{*path}", get(handlers::asset::get_asset))
        .route("/ws", get(handlers::ws::ws_upgrade))
        .route("/health", get(handlers::health::health))
        .nest_service("/static", static_files)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}
