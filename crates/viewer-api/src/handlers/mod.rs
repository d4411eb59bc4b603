//! Route handlers.

pub mod asset;
pub mod health;
pub mod index;
pub mod ws;
