//! Contract between the connection layer and the simulation that owns
//! each participant ("player").
//!
//! A session is consumed through exactly three primitives: an inbound
//! channel the connection writes socket payloads into, an outbound channel
//! the connection drains towards the socket, and a one-shot termination
//! signal. The session's own state stays on the simulation side.

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};

use crate::types::SessionId;

/// Factory for new sessions, implemented by the simulation engine.
pub trait Simulation: Send + Sync + 'static {
    /// Create a new session for a freshly upgraded connection.
    fn new_session(&self) -> Session;
}

/// A newly created session: its port plus the future that runs it.
pub struct Session {
    /// Channels handed to the connection.
    pub port: SessionPort,
    /// The session's own execution; the caller spawns it.
    pub task: BoxFuture<'static, ()>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.port.id).finish()
    }
}

/// Connection-side view of a session.
#[derive(Debug)]
pub struct SessionPort {
    /// Session identifier.
    pub id: SessionId,
    /// Payloads received from the socket go here.
    pub inbound: mpsc::Sender<Bytes>,
    /// Application-originated payloads destined for the socket.
    pub outbound: mpsc::Receiver<Bytes>,
    /// Requests the session to end.
    pub terminator: SessionTerminator,
}

/// Simulation-side view of a session, the counterpart of [`SessionPort`].
#[derive(Debug)]
pub struct SessionChannels {
    /// Session identifier.
    pub id: SessionId,
    /// Payloads received from the client.
    pub inbound: mpsc::Receiver<Bytes>,
    /// Payloads to deliver to the client.
    pub outbound: mpsc::Sender<Bytes>,
    /// Resolves once termination is requested or the terminator is dropped.
    pub terminated: oneshot::Receiver<()>,
}

impl SessionPort {
    /// Create a connected port/channels pair with `buffer` capacity in each
    /// direction.
    pub fn pair(buffer: usize) -> (SessionPort, SessionChannels) {
        let id = SessionId::new();
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer);
        let (outbound_tx, outbound_rx) = mpsc::channel(buffer);
        let (terminator, terminated) = SessionTerminator::new();

        let port = SessionPort {
            id,
            inbound: inbound_tx,
            outbound: outbound_rx,
            terminator,
        };
        let channels = SessionChannels {
            id,
            inbound: inbound_rx,
            outbound: outbound_tx,
            terminated,
        };
        (port, channels)
    }
}

/// One-shot termination signal for a session.
///
/// The signal can be asserted at most once; the sender is consumed by the
/// first [`terminate`](Self::terminate) call.
#[derive(Debug)]
pub struct SessionTerminator {
    tx: Option<oneshot::Sender<()>>,
}

impl SessionTerminator {
    /// Create a terminator and the receiver the session listens on.
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Assert the termination signal.
    ///
    /// Returns `true` if this call asserted it, `false` if it had already
    /// been asserted.
    pub fn terminate(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => {
                // The session may already have exited on its own.
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    /// Whether the signal has been asserted.
    pub fn is_terminated(&self) -> bool {
        self.tx.is_none()
    }
}
