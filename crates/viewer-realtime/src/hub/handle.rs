//! Cloneable handle used to submit requests to the hub.

use tokio::sync::{mpsc, oneshot};

use viewer_core::error::AppError;
use viewer_core::result::AppResult;
use viewer_core::types::ConnectionId;

use super::{Registration, SnapshotRequest};

/// Injected reference to the running [`Hub`](super::Hub).
///
/// Every operation fails with `ServiceUnavailable` once the hub loop has
/// stopped.
#[derive(Debug, Clone)]
pub struct HubHandle {
    register_tx: mpsc::Sender<Registration>,
    unregister_tx: mpsc::Sender<ConnectionId>,
    snapshot_tx: mpsc::Sender<SnapshotRequest>,
}

impl HubHandle {
    pub(crate) fn new(
        register_tx: mpsc::Sender<Registration>,
        unregister_tx: mpsc::Sender<ConnectionId>,
        snapshot_tx: mpsc::Sender<SnapshotRequest>,
    ) -> Self {
        Self {
            register_tx,
            unregister_tx,
            snapshot_tx,
        }
    }

    /// Add a connection to the active set.
    ///
    /// If the hub has stopped the registration is dropped, which releases
    /// the bound session.
    pub async fn register(&self, registration: Registration) -> AppResult<()> {
        self.register_tx
            .send(registration)
            .await
            .map_err(|_| hub_stopped())
    }

    /// Request removal of a connection. Unknown IDs are ignored by the hub.
    pub async fn unregister(&self, id: ConnectionId) -> AppResult<()> {
        self.unregister_tx
            .send(id)
            .await
            .map_err(|_| hub_stopped())
    }

    /// Snapshot of the currently registered connection IDs.
    pub async fn active_connections(&self) -> AppResult<Vec<ConnectionId>> {
        let (tx, rx) = oneshot::channel();
        self.snapshot_tx.send(tx).await.map_err(|_| hub_stopped())?;
        rx.await.map_err(|_| hub_stopped())
    }
}

fn hub_stopped() -> AppError {
    AppError::service_unavailable("connection hub is not running")
}
