//! # viewer-cache
//!
//! Asset cache for the viewer server. Assets are read from a root
//! directory on first access and kept in an in-process cache built on
//! [moka](https://crates.io/crates/moka).

pub mod assets;

pub use assets::AssetCache;
