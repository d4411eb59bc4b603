//! Core type definitions used across the viewer workspace.

pub mod id;

pub use id::*;
