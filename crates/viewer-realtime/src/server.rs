//! Top-level real-time engine: the hub task plus what every connection needs.

use std::sync::Arc;

use axum::extract::ws::Message;
use futures::{Sink, Stream};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use viewer_core::config::realtime::RealtimeConfig;
use viewer_core::traits::Simulation;

use crate::connection::{HeartbeatConfig, serve_connection};
use crate::hub::{Hub, HubHandle};
use crate::metrics::RealtimeMetrics;

/// Central real-time engine shared by the upgrade endpoint.
pub struct RealtimeEngine {
    /// Handle to the running hub.
    hub: HubHandle,
    /// Session factory.
    simulation: Arc<dyn Simulation>,
    /// Engine configuration.
    config: RealtimeConfig,
    /// Derived heartbeat timing.
    heartbeat: HeartbeatConfig,
    /// Metrics collector.
    metrics: Arc<RealtimeMetrics>,
    /// Shutdown signal for the hub loop.
    shutdown_tx: watch::Sender<bool>,
    /// Hub task, taken on shutdown.
    hub_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("heartbeat", &self.heartbeat)
            .finish()
    }
}

impl RealtimeEngine {
    /// Create the engine and spawn its hub loop. Must be called from within
    /// a tokio runtime.
    pub fn start(config: RealtimeConfig, simulation: Arc<dyn Simulation>) -> Self {
        let metrics = Arc::new(RealtimeMetrics::new());
        let (hub, handle) = Hub::new(config.hub_intake_buffer, metrics.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let hub_task = tokio::spawn(hub.run(shutdown_rx));
        let heartbeat = HeartbeatConfig::from_config(&config);

        info!(
            ping_period_ms = heartbeat.ping_period.as_millis() as u64,
            pong_wait_ms = heartbeat.pong_wait.as_millis() as u64,
            max_message_size = heartbeat.max_message_size,
            "Real-time engine initialized"
        );

        Self {
            hub: handle,
            simulation,
            config,
            heartbeat,
            metrics,
            shutdown_tx,
            hub_task: Mutex::new(Some(hub_task)),
        }
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    pub fn metrics(&self) -> &Arc<RealtimeMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Serve one upgraded socket until its connection is torn down.
    pub async fn serve<S, E>(&self, socket: S)
    where
        S: Stream<Item = Result<Message, E>> + Sink<Message> + Send + 'static,
        <S as Sink<Message>>::Error: std::fmt::Display + Send,
        E: std::fmt::Display + Send,
    {
        serve_connection(
            socket,
            self.simulation.as_ref(),
            &self.hub,
            self.heartbeat,
            self.config.send_buffer_size,
            self.metrics.clone(),
        )
        .await;
    }

    /// Stop the hub. Every remaining connection is unregistered, which
    /// sends each peer a close frame.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(true);

        if let Some(task) = self.hub_task.lock().await.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Hub task ended abnormally");
            }
        }
        info!("Real-time engine shut down");
    }
}
