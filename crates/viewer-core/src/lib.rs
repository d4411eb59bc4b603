//! # viewer-core
//!
//! Core crate for the viewer server. Contains configuration schemas,
//! typed identifiers, the contract consumed from the simulation
//! (sessions and asset retrieval), and the unified error system.
//!
//! This crate has **no** internal dependencies on other viewer crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
