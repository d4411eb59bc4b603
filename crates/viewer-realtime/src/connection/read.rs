//! Read pump: socket frames into the session's inbound channel.

use std::sync::Arc;

use axum::extract::ws::Message;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

use crate::hub::HubHandle;
use crate::metrics::RealtimeMetrics;

use super::ConnectionReader;
use super::heartbeat::HeartbeatConfig;

/// Why the read pump stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadExit {
    /// The peer sent a close frame or the stream ended.
    PeerClosed,
    /// The socket reported an error.
    ReadFailed(String),
    /// No pong arrived within the pong window.
    DeadlineExpired,
    /// A payload exceeded the size limit.
    Oversized(usize),
    /// The session stopped accepting input.
    SessionClosed,
    /// The write pump exited, so the socket is unusable.
    WriterClosed,
}

/// Pump frames from the socket into the session until the socket is unusable.
///
/// The read deadline starts at `pong_wait` and is pushed forward only when a
/// pong arrives. On exit the pump asks the hub to unregister the connection
/// exactly once and then drops its half of the socket.
pub async fn read_pump<S, E>(
    mut stream: S,
    reader: ConnectionReader,
    hub: &HubHandle,
    heartbeat: HeartbeatConfig,
    metrics: Arc<RealtimeMetrics>,
) -> ReadExit
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    let ConnectionReader {
        id,
        inbound,
        mut writer_done,
    } = reader;

    let deadline = sleep_until(Instant::now() + heartbeat.pong_wait);
    tokio::pin!(deadline);

    let exit = loop {
        let frame = tokio::select! {
            _ = &mut writer_done => break ReadExit::WriterClosed,
            () = &mut deadline => break ReadExit::DeadlineExpired,
            frame = stream.next() => frame,
        };

        let payload = match frame {
            None | Some(Ok(Message::Close(_))) => break ReadExit::PeerClosed,
            Some(Err(e)) => break ReadExit::ReadFailed(e.to_string()),
            Some(Ok(Message::Pong(_))) => {
                deadline
                    .as_mut()
                    .reset(Instant::now() + heartbeat.pong_wait);
                continue;
            }
            // Pongs for client pings are queued by the socket itself.
            Some(Ok(Message::Ping(_))) => continue,
            Some(Ok(Message::Text(text))) => Bytes::from(text),
            Some(Ok(Message::Binary(data))) => data,
        };

        if payload.len() > heartbeat.max_message_size {
            warn!(
                conn_id = %id,
                size = payload.len(),
                limit = heartbeat.max_message_size,
                "Inbound message too large"
            );
            break ReadExit::Oversized(payload.len());
        }

        // A session that stops draining must not stall the exits.
        tokio::select! {
            _ = &mut writer_done => break ReadExit::WriterClosed,
            () = &mut deadline => break ReadExit::DeadlineExpired,
            sent = inbound.send(payload) => {
                if sent.is_err() {
                    break ReadExit::SessionClosed;
                }
            }
        }
        metrics.record_received();
    };

    debug!(conn_id = %id, reason = ?exit, "Read pump stopped");

    if let Err(e) = hub.unregister(id).await {
        debug!(conn_id = %id, error = %e, "Unregister skipped");
    }
    drop(stream);

    exit
}
