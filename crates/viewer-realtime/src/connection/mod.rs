//! WebSocket connections: one socket paired with one session.
//!
//! A connection runs two pumps. The read pump owns teardown: when the
//! socket becomes unusable it asks the hub to unregister the connection.
//! The write pump owns every socket write and exits when the hub closes the
//! connection's control buffer. The only links between the two are the
//! control buffer (closed by the hub) and a one-shot the write pump drops
//! when it exits.

pub mod heartbeat;
pub mod read;
pub mod write;

use std::sync::Arc;

use axum::extract::ws::Message;
use bytes::Bytes;
use futures::{Sink, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use viewer_core::traits::{Session, SessionPort, Simulation};
use viewer_core::types::{ConnectionId, SessionId};

use crate::hub::{HubHandle, Registration};
use crate::metrics::RealtimeMetrics;

pub use heartbeat::HeartbeatConfig;
pub use read::{ReadExit, read_pump};
pub use write::{WriteExit, write_pump};

/// Errors raised while writing to the socket.
#[derive(Debug, Error)]
pub enum PumpError {
    /// The peer did not absorb the frame within the write deadline.
    #[error("write deadline exceeded")]
    WriteTimeout,
    /// The socket rejected the frame.
    #[error("socket write failed: {0}")]
    Write(String),
}

/// A socket-side connection bound to a session, before its pumps start.
#[derive(Debug)]
pub struct Connection {
    /// Connection ID
    pub id: ConnectionId,
    /// Bound session ID
    pub session_id: SessionId,
    reader: ConnectionReader,
    writer: ConnectionWriter,
}

/// State owned by the read pump.
#[derive(Debug)]
pub struct ConnectionReader {
    /// Connection ID
    pub id: ConnectionId,
    /// Session inbound channel
    inbound: mpsc::Sender<Bytes>,
    /// Resolves when the write pump exits
    writer_done: oneshot::Receiver<()>,
}

/// State owned by the write pump.
#[derive(Debug)]
pub struct ConnectionWriter {
    /// Connection ID
    pub id: ConnectionId,
    /// Session outbound channel
    outbound: mpsc::Receiver<Bytes>,
    /// Hub-originated control pushes; closed by the hub on unregister
    control: mpsc::Receiver<Bytes>,
    /// Dropped when the write pump exits
    done: oneshot::Sender<()>,
}

impl Connection {
    /// Pair a session port with a fresh, empty control buffer.
    ///
    /// Returns the connection and the registration to hand to the hub. The
    /// registration carries the only sender of the control buffer.
    pub fn new(port: SessionPort, send_buffer: usize) -> (Self, Registration) {
        let id = ConnectionId::new();
        let SessionPort {
            id: session_id,
            inbound,
            outbound,
            terminator,
        } = port;

        let (control_tx, control_rx) = mpsc::channel(send_buffer);
        let (done_tx, done_rx) = oneshot::channel();

        let connection = Self {
            id,
            session_id,
            reader: ConnectionReader {
                id,
                inbound,
                writer_done: done_rx,
            },
            writer: ConnectionWriter {
                id,
                outbound,
                control: control_rx,
                done: done_tx,
            },
        };
        let registration = Registration::new(id, session_id, control_tx, terminator);
        (connection, registration)
    }

    /// Split into the halves driven by the read and write pumps.
    pub fn split(self) -> (ConnectionReader, ConnectionWriter) {
        (self.reader, self.writer)
    }
}

/// Drive one upgraded socket until it is torn down.
///
/// Creates the session, starts it, registers the connection, spawns the
/// write pump and runs the read pump on the calling task, so this returns
/// once the read pump has exited.
pub async fn serve_connection<S, E>(
    socket: S,
    simulation: &dyn Simulation,
    hub: &HubHandle,
    heartbeat: HeartbeatConfig,
    send_buffer: usize,
    metrics: Arc<RealtimeMetrics>,
) where
    S: Stream<Item = Result<Message, E>> + Sink<Message> + Send + 'static,
    <S as Sink<Message>>::Error: std::fmt::Display + Send,
    E: std::fmt::Display + Send,
{
    let Session { port, task } = simulation.new_session();
    let (connection, registration) = Connection::new(port, send_buffer);
    let conn_id = connection.id;
    tokio::spawn(task);

    if let Err(e) = hub.register(registration).await {
        warn!(conn_id = %conn_id, error = %e, "Dropping connection, hub unavailable");
        return;
    }

    let (sink, stream) = socket.split();
    let (reader, writer) = connection.split();

    tokio::spawn(write_pump(sink, writer, heartbeat, metrics.clone()));
    let exit = read_pump(stream, reader, hub, heartbeat, metrics).await;

    debug!(conn_id = %conn_id, reason = ?exit, "Connection finished");
}
