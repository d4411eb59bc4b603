//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, connections_active) = match state.realtime.hub().active_connections().await {
        Ok(ids) => ("ok", ids.len()),
        Err(_) => ("unavailable", 0),
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        connections_active,
        metrics: state.realtime.metrics().snapshot(),
    })
}
