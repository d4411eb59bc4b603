//! WebSocket upgrade handler.

use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use tracing::{debug, warn};

use crate::state::AppState;

/// GET /ws
///
/// A rejected upgrade never reaches the engine, so no session is created.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let max_message_size = state.realtime.config().max_message_size;

    ws.max_message_size(max_message_size)
        .on_failed_upgrade(|e| warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| async move {
            debug!("WebSocket connection established");
            state.realtime.serve(socket).await;
        })
}
