//! Application state shared across all handlers.

use std::sync::Arc;

use viewer_core::config::AppConfig;
use viewer_core::traits::AssetSource;
use viewer_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Real-time engine owning the connection hub
    pub realtime: Arc<RealtimeEngine>,
    /// Asset source behind `/asset`
    pub assets: Arc<dyn AssetSource>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        realtime: Arc<RealtimeEngine>,
        assets: Arc<dyn AssetSource>,
    ) -> Self {
        Self {
            config,
            realtime,
            assets,
        }
    }
}
