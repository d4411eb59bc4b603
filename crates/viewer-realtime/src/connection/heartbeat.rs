//! Liveness timing shared by the read and write pumps.

use std::time::Duration;

use viewer_core::config::realtime::RealtimeConfig;

/// Heartbeat and deadline configuration for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Deadline applied to every frame write.
    pub write_wait: Duration,
    /// Read deadline, pushed forward by every pong.
    pub pong_wait: Duration,
    /// Interval between pings; always below `pong_wait`.
    pub ping_period: Duration,
    /// Largest inbound payload accepted.
    pub max_message_size: usize,
}

impl HeartbeatConfig {
    /// Derive the heartbeat settings from the realtime configuration.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self {
            write_wait: config.write_wait(),
            pong_wait: config.pong_wait(),
            ping_period: config.ping_period(),
            max_message_size: config.max_message_size,
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}
