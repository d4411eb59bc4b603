//! # viewer-api
//!
//! HTTP layer of the viewer server built on Axum.
//!
//! Serves the HTML shell, static files and assets, reports health, and
//! upgrades `/ws` requests into connections driven by the real-time engine.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
