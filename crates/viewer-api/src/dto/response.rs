//! Response DTOs.

use serde::{Deserialize, Serialize};

use viewer_realtime::metrics::MetricsSnapshot;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok`, or `unavailable` once the connection hub has stopped
    pub status: String,
    /// Server version
    pub version: String,
    /// Connections currently registered with the hub
    pub connections_active: usize,
    /// Connection and message counters
    pub metrics: MetricsSnapshot,
}
