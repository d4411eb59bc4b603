//! # viewer-realtime
//!
//! Connection-management layer of the viewer server:
//!
//! - [`Hub`]: single task owning the set of active connections
//! - read and write pumps moving frames between a socket and a session
//! - ping/pong heartbeat and per-write deadlines
//! - [`LoopbackWorld`]: an echoing stand-in for the simulation

pub mod connection;
pub mod hub;
pub mod metrics;
pub mod server;
pub mod session;

pub use connection::Connection;
pub use hub::{Hub, HubHandle, Registration};
pub use metrics::RealtimeMetrics;
pub use server::RealtimeEngine;
pub use session::loopback::LoopbackWorld;
