//! Simulation implementations bundled with the server.

pub mod loopback;

pub use loopback::{LoopbackStats, LoopbackWorld};
