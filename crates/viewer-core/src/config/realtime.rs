//! Real-time WebSocket engine configuration.
//!
//! The defaults are the wire cadence peers expect: a 10s write deadline,
//! a 60s pong window and pings every 54s.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Time allowed to write a message to the peer.
pub const WRITE_WAIT: Duration = Duration::from_secs(10);

/// Time allowed to read the next pong message from the peer.
pub const PONG_WAIT: Duration = Duration::from_secs(60);

/// Send pings to the peer with this period. Must be less than [`PONG_WAIT`].
pub const PING_PERIOD: Duration = Duration::from_secs(54);

/// Maximum message size allowed from the peer.
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Capacity of a connection's control buffer.
pub const SEND_BUFFER_SIZE: usize = 256;

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Write deadline per frame in seconds.
    #[serde(default = "default_write_wait")]
    pub write_wait_seconds: u64,
    /// Read deadline in seconds, refreshed by every pong.
    #[serde(default = "default_pong_wait")]
    pub pong_wait_seconds: u64,
    /// Largest inbound payload in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Capacity of each connection's control buffer.
    #[serde(default = "default_send_buffer")]
    pub send_buffer_size: usize,
    /// Capacity of each session's inbound and outbound channels.
    #[serde(default = "default_session_buffer")]
    pub session_buffer_size: usize,
    /// Capacity of the hub's register/unregister intake channels.
    #[serde(default = "default_hub_intake")]
    pub hub_intake_buffer: usize,
}

impl RealtimeConfig {
    /// Write deadline.
    pub fn write_wait(&self) -> Duration {
        Duration::from_secs(self.write_wait_seconds)
    }

    /// Read deadline window.
    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_seconds)
    }

    /// Heartbeat period, always 9/10 of the pong window so at least one
    /// ping lands inside every window.
    pub fn ping_period(&self) -> Duration {
        self.pong_wait() * 9 / 10
    }

    /// Reject settings that would stop the heartbeat or size a channel at zero.
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("write_wait_seconds", self.write_wait_seconds as usize),
            ("pong_wait_seconds", self.pong_wait_seconds as usize),
            ("max_message_size", self.max_message_size),
            ("send_buffer_size", self.send_buffer_size),
            ("session_buffer_size", self.session_buffer_size),
            ("hub_intake_buffer", self.hub_intake_buffer),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(AppError::configuration(format!(
                "realtime.{name} must be greater than zero"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            write_wait_seconds: default_write_wait(),
            pong_wait_seconds: default_pong_wait(),
            max_message_size: default_max_message_size(),
            send_buffer_size: default_send_buffer(),
            session_buffer_size: default_session_buffer(),
            hub_intake_buffer: default_hub_intake(),
        }
    }
}

fn default_write_wait() -> u64 {
    WRITE_WAIT.as_secs()
}

fn default_pong_wait() -> u64 {
    PONG_WAIT.as_secs()
}

fn default_max_message_size() -> usize {
    MAX_MESSAGE_SIZE
}

fn default_send_buffer() -> usize {
    SEND_BUFFER_SIZE
}

fn default_session_buffer() -> usize {
    256
}

fn default_hub_intake() -> usize {
    64
}
