//! HTML shell handler.

use axum::extract::State;
use axum::response::Html;

use viewer_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /, the page hosting the viewer client
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let path = &state.config.server.index_file;
    let page = tokio::fs::read_to_string(path).await.map_err(|e| {
        let err = AppError::from(e);
        AppError::new(err.kind, format!("index '{path}': {}", err.message))
    })?;
    Ok(Html(page))
}
