//! Connection hub: the single authority over the set of active connections.
//!
//! The active set lives inside [`Hub::run`] and nothing else can touch it.
//! Other tasks talk to the hub through a cloneable [`HubHandle`].

pub mod handle;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info};

use viewer_core::traits::SessionTerminator;
use viewer_core::types::{ConnectionId, SessionId};

use crate::metrics::RealtimeMetrics;

pub use handle::HubHandle;

/// Bootstrap message pushed to every connection right after registration.
pub const LOAD_MESSAGE: &[u8] = b"load";

/// Everything the hub needs to manage one connection.
///
/// The hub holds the only sender of the connection's control buffer, so
/// removing the registration is what closes the buffer.
#[derive(Debug)]
pub struct Registration {
    /// Connection ID
    pub id: ConnectionId,
    /// Session bound to this connection
    pub session_id: SessionId,
    /// Sender half of the connection's control buffer
    control: mpsc::Sender<Bytes>,
    /// Termination signal of the bound session
    terminator: SessionTerminator,
}

impl Registration {
    /// Create a registration from its parts.
    pub fn new(
        id: ConnectionId,
        session_id: SessionId,
        control: mpsc::Sender<Bytes>,
        terminator: SessionTerminator,
    ) -> Self {
        Self {
            id,
            session_id,
            control,
            terminator,
        }
    }
}

/// Query sent to the hub for a snapshot of the active set.
pub(crate) type SnapshotRequest = oneshot::Sender<Vec<ConnectionId>>;

/// Coordinating loop over the register, unregister and snapshot intakes.
#[derive(Debug)]
pub struct Hub {
    /// Registered connections.
    connections: HashMap<ConnectionId, Registration>,
    /// Register requests from the upgrade endpoint.
    register_rx: mpsc::Receiver<Registration>,
    /// Unregister requests from read pumps.
    unregister_rx: mpsc::Receiver<ConnectionId>,
    /// Snapshot queries.
    snapshot_rx: mpsc::Receiver<SnapshotRequest>,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
}

impl Hub {
    /// Create a hub and the handle used to reach it.
    pub fn new(intake_buffer: usize, metrics: Arc<RealtimeMetrics>) -> (Self, HubHandle) {
        let (register_tx, register_rx) = mpsc::channel(intake_buffer);
        let (unregister_tx, unregister_rx) = mpsc::channel(intake_buffer);
        let (snapshot_tx, snapshot_rx) = mpsc::channel(intake_buffer);

        let hub = Self {
            connections: HashMap::new(),
            register_rx,
            unregister_rx,
            snapshot_rx,
            metrics,
        };
        let handle = HubHandle::new(register_tx, unregister_tx, snapshot_tx);
        (hub, handle)
    }

    /// Run the hub until shutdown is signalled or every handle is dropped.
    ///
    /// On exit every remaining connection is unregistered, which makes each
    /// write pump send its close frame.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Connection hub started");

        loop {
            tokio::select! {
                // Registrations drain before unregistrations so a connection
                // that fails immediately is never left in the set.
                biased;

                registration = self.register_rx.recv() => match registration {
                    Some(registration) => self.register(registration),
                    None => break,
                },
                id = self.unregister_rx.recv() => match id {
                    Some(id) => {
                        self.unregister(id);
                    }
                    None => break,
                },
                reply = self.snapshot_rx.recv() => match reply {
                    Some(reply) => {
                        let _ = reply.send(self.active_connections());
                    }
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.close_all();
        info!("Connection hub stopped");
    }

    /// Add a connection to the active set and push the bootstrap message.
    fn register(&mut self, registration: Registration) {
        let id = registration.id;

        match registration.control.try_send(Bytes::from_static(LOAD_MESSAGE)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                // The buffer is freshly allocated; a full buffer here means
                // the connection was wired wrong.
                error!(conn_id = %id, "Control buffer full at registration");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(conn_id = %id, "Write pump already gone at registration");
            }
        }

        info!(
            conn_id = %id,
            session_id = %registration.session_id,
            "Connection registered"
        );
        self.connections.insert(id, registration);
        self.metrics.record_connect();
    }

    /// Remove a connection, terminate its session and close its buffer.
    ///
    /// Returns `false` if the connection was not registered.
    fn unregister(&mut self, id: ConnectionId) -> bool {
        let Some(mut registration) = self.connections.remove(&id) else {
            debug!(conn_id = %id, "Ignoring unregister for unknown connection");
            return false;
        };

        registration.terminator.terminate();
        // Dropping the registration drops the last control sender.
        drop(registration);
        self.metrics.record_disconnect();

        info!(conn_id = %id, "Connection unregistered");
        true
    }

    fn close_all(&mut self) {
        let ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        for id in &ids {
            self.unregister(*id);
        }
        if !ids.is_empty() {
            info!(count = ids.len(), "Closed remaining connections");
        }
    }

    /// IDs of the currently registered connections.
    fn active_connections(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Probe {
        registration: Registration,
        control_rx: mpsc::Receiver<Bytes>,
        terminated: oneshot::Receiver<()>,
    }

    fn probe() -> Probe {
        let (control, control_rx) = mpsc::channel(8);
        let (terminator, terminated) = SessionTerminator::new();
        Probe {
            registration: Registration::new(
                ConnectionId::new(),
                SessionId::new(),
                control,
                terminator,
            ),
            control_rx,
            terminated,
        }
    }

    fn make_hub() -> (Hub, HubHandle) {
        Hub::new(16, Arc::new(RealtimeMetrics::new()))
    }

    #[tokio::test]
    async fn register_pushes_load() {
        let (mut hub, _handle) = make_hub();
        let mut p = probe();
        let id = p.registration.id;

        hub.register(p.registration);

        assert_eq!(hub.active_connections(), vec![id]);
        assert_eq!(p.control_rx.recv().await.unwrap(), "load");
        assert!(p.control_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_terminates_and_closes_buffer() {
        let (mut hub, _handle) = make_hub();
        let mut p = probe();
        let id = p.registration.id;
        hub.register(p.registration);

        assert!(hub.unregister(id));

        assert!(hub.active_connections().is_empty());
        assert!(p.terminated.await.is_ok());
        assert_eq!(p.control_rx.recv().await.unwrap(), "load");
        assert!(p.control_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn double_unregister_is_noop() {
        let (mut hub, _handle) = make_hub();
        let p = probe();
        let id = p.registration.id;
        let keep = probe();
        let keep_id = keep.registration.id;
        hub.register(p.registration);
        hub.register(keep.registration);

        assert!(hub.unregister(id));
        assert!(!hub.unregister(id));
        assert!(!hub.unregister(ConnectionId::new()));

        assert_eq!(hub.active_connections(), vec![keep_id]);
        assert_eq!(hub.metrics.snapshot().connections_active, 1);
    }

    #[tokio::test]
    async fn membership_follows_request_sequence() {
        let (mut hub, _handle) = make_hub();
        let mut expected = HashSet::new();
        let mut known = Vec::new();
        let mut keep = Vec::new();

        // Deterministic interleaving of registers, unregisters and repeats.
        for step in 0u32..60 {
            if step % 3 == 2 && !known.is_empty() {
                let victim: ConnectionId = known[(step as usize * 7) % known.len()];
                hub.unregister(victim);
                expected.remove(&victim);
            } else {
                let p = probe();
                let id = p.registration.id;
                hub.register(p.registration);
                expected.insert(id);
                known.push(id);
                keep.push((p.control_rx, p.terminated));
            }
        }

        let actual: HashSet<_> = hub.active_connections().into_iter().collect();
        assert_eq!(actual, expected);
        assert_eq!(
            hub.metrics.snapshot().connections_active,
            expected.len() as u64
        );
    }

    #[tokio::test]
    async fn run_processes_requests_through_handle() {
        let (hub, handle) = make_hub();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(hub.run(shutdown_rx));

        let mut a = probe();
        let b = probe();
        let (a_id, b_id) = (a.registration.id, b.registration.id);
        handle.register(a.registration).await.unwrap();
        handle.register(b.registration).await.unwrap();
        handle.unregister(a_id).await.unwrap();
        handle.unregister(a_id).await.unwrap();

        assert_eq!(handle.active_connections().await.unwrap(), vec![b_id]);
        assert!(a.terminated.await.is_ok());
        assert_eq!(a.control_rx.recv().await.unwrap(), "load");
        assert!(a.control_rx.recv().await.is_none());

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn queued_unregister_never_overtakes_register() {
        let (hub, handle) = make_hub();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let p = probe();
        let id = p.registration.id;
        // Both requests are queued before the hub starts polling.
        handle.register(p.registration).await.unwrap();
        handle.unregister(id).await.unwrap();

        let task = tokio::spawn(hub.run(shutdown_rx));
        assert!(handle.active_connections().await.unwrap().is_empty());
        assert!(p.terminated.await.is_ok());

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_unregisters_everything() {
        let (hub, handle) = make_hub();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(hub.run(shutdown_rx));

        let mut p = probe();
        handle.register(p.registration).await.unwrap();
        assert_eq!(handle.active_connections().await.unwrap().len(), 1);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        assert!(p.terminated.await.is_ok());
        assert_eq!(p.control_rx.recv().await.unwrap(), "load");
        assert!(p.control_rx.recv().await.is_none());
        assert!(handle.active_connections().await.is_err());
    }
}
