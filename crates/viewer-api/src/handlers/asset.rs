//! Asset retrieval handler.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::warn;

use crate::state::AppState;

/// GET /asset/{*path}
///
/// Failures are reported as a plain-text 500 carrying the error text, and
/// nothing else is written.
pub async fn get_asset(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    match state.assets.cat(&path).await {
        Ok(data) => asset_response(data),
        Err(e) => {
            warn!(path = %path, error = %e, "Asset retrieval failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn asset_response(data: Bytes) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    )
        .into_response()
}
