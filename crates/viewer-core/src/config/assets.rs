//! Asset cache configuration.

use serde::{Deserialize, Serialize};

/// Asset retrieval and caching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Directory that asset paths are resolved against.
    #[serde(default = "default_root")]
    pub root: String,
    /// Maximum number of cached assets.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// TTL for cached assets in seconds.
    #[serde(default = "default_ttl")]
    pub time_to_live_seconds: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_capacity: default_max_capacity(),
            time_to_live_seconds: default_ttl(),
        }
    }
}

fn default_root() -> String {
    "assets".to_string()
}

fn default_max_capacity() -> u64 {
    1024
}

fn default_ttl() -> u64 {
    300
}
