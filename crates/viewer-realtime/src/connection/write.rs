//! Write pump: the only task allowed to write to a socket.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use bytes::Bytes;
use futures::{Sink, SinkExt};
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tracing::{debug, warn};

use crate::metrics::RealtimeMetrics;

use super::heartbeat::HeartbeatConfig;
use super::{ConnectionWriter, PumpError};

/// Why the write pump stopped.
#[derive(Debug)]
pub enum WriteExit {
    /// The hub closed the control buffer; a close frame was attempted.
    Unregistered,
    /// A frame could not be written.
    WriteFailed(PumpError),
}

/// Pump frames from the control buffer and the session to the socket.
///
/// Sends a ping every `ping_period`. Every write must finish within
/// `write_wait`. When the hub closes the control buffer a close frame is sent
/// and the pump exits. On any exit the socket sink is closed and the read
/// pump is woken.
pub async fn write_pump<K>(
    mut sink: K,
    writer: ConnectionWriter,
    heartbeat: HeartbeatConfig,
    metrics: Arc<RealtimeMetrics>,
) -> WriteExit
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    let ConnectionWriter {
        id,
        mut outbound,
        mut control,
        done,
    } = writer;

    let mut ticker = interval_at(
        Instant::now() + heartbeat.ping_period,
        heartbeat.ping_period,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut session_open = true;

    let exit = loop {
        let result = tokio::select! {
            biased;

            pushed = control.recv() => match pushed {
                Some(payload) => write_data(&mut sink, payload, &heartbeat, &metrics).await,
                None => {
                    if let Err(e) = write_frame(&mut sink, Message::Close(None), heartbeat.write_wait).await {
                        debug!(conn_id = %id, error = %e, "Close frame not delivered");
                    }
                    break WriteExit::Unregistered;
                }
            },
            produced = outbound.recv(), if session_open => match produced {
                Some(payload) => write_data(&mut sink, payload, &heartbeat, &metrics).await,
                None => {
                    // Stay up for pings until the hub closes the connection.
                    debug!(conn_id = %id, "Session output ended");
                    session_open = false;
                    Ok(())
                }
            },
            _ = ticker.tick() => {
                let sent = write_frame(&mut sink, Message::Ping(Bytes::new()), heartbeat.write_wait).await;
                if sent.is_ok() {
                    metrics.record_ping();
                }
                sent
            }
        };

        if let Err(e) = result {
            warn!(conn_id = %id, error = %e, "Socket write failed");
            break WriteExit::WriteFailed(e);
        }
    };

    drop(ticker);
    if timeout(heartbeat.write_wait, sink.close()).await.is_err() {
        debug!(conn_id = %id, "Socket close timed out");
    }
    debug!(conn_id = %id, reason = ?exit, "Write pump stopped");
    drop(done);

    exit
}

async fn write_data<K>(
    sink: &mut K,
    payload: Bytes,
    heartbeat: &HeartbeatConfig,
    metrics: &RealtimeMetrics,
) -> Result<(), PumpError>
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    write_frame(sink, data_frame(payload), heartbeat.write_wait).await?;
    metrics.record_sent();
    Ok(())
}

/// Write one frame under the write deadline.
async fn write_frame<K>(sink: &mut K, frame: Message, write_wait: Duration) -> Result<(), PumpError>
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    match timeout(write_wait, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(PumpError::Write(e.to_string())),
        Err(_) => Err(PumpError::WriteTimeout),
    }
}

/// UTF-8 payloads go out as text frames, everything else as binary.
fn data_frame(payload: Bytes) -> Message {
    match std::str::from_utf8(&payload) {
        Ok(text) => Message::Text(text.into()),
        Err(_) => Message::Binary(payload),
    }
}
