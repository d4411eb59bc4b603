//! Echoing stand-in for the simulation engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tracing::debug;

use viewer_core::traits::{Session, SessionChannels, SessionPort, Simulation};

/// Simulation whose sessions send every inbound payload straight back.
///
/// Sessions stop when their termination signal fires, when the connection
/// stops listening, or when the inbound channel closes.
#[derive(Debug, Clone)]
pub struct LoopbackWorld {
    buffer: usize,
    stats: Arc<LoopbackStats>,
}

/// Session counters shared by every clone of a [`LoopbackWorld`].
#[derive(Debug, Default)]
pub struct LoopbackStats {
    started: AtomicU64,
    stopped: AtomicU64,
    echoed: AtomicU64,
}

impl LoopbackStats {
    pub fn sessions_started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    pub fn sessions_stopped(&self) -> u64 {
        self.stopped.load(Ordering::Relaxed)
    }

    pub fn payloads_echoed(&self) -> u64 {
        self.echoed.load(Ordering::Relaxed)
    }
}

impl LoopbackWorld {
    /// Create a world whose session channels hold `buffer` payloads each way.
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer,
            stats: Arc::new(LoopbackStats::default()),
        }
    }

    pub fn stats(&self) -> &LoopbackStats {
        &self.stats
    }
}

impl Simulation for LoopbackWorld {
    fn new_session(&self) -> Session {
        let (port, channels) = SessionPort::pair(self.buffer);
        self.stats.started.fetch_add(1, Ordering::Relaxed);

        Session {
            port,
            task: run_session(channels, self.stats.clone()).boxed(),
        }
    }
}

async fn run_session(channels: SessionChannels, stats: Arc<LoopbackStats>) {
    let SessionChannels {
        id,
        mut inbound,
        outbound,
        mut terminated,
    } = channels;
    debug!(session_id = %id, "Loopback session started");

    loop {
        tokio::select! {
            _ = &mut terminated => break,
            payload = inbound.recv() => {
                let Some(payload) = payload else { break };
                if outbound.send(payload).await.is_err() {
                    break;
                }
                stats.echoed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    stats.stopped.fetch_add(1, Ordering::Relaxed);
    debug!(session_id = %id, "Loopback session stopped");
}
