//! Core traits defined in `viewer-core` and implemented by other crates
//! or by the embedding simulation.

pub mod assets;
pub mod session;

pub use assets::AssetSource;
pub use session::{Session, SessionChannels, SessionPort, SessionTerminator, Simulation};
