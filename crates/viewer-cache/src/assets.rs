//! Asset cache backed by the filesystem and the moka crate.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use tracing::debug;

use viewer_core::config::assets::AssetConfig;
use viewer_core::error::AppError;
use viewer_core::result::AppResult;
use viewer_core::traits::AssetSource;

/// Filesystem asset source with an in-memory cache in front of it.
#[derive(Debug, Clone)]
pub struct AssetCache {
    /// Directory asset paths are resolved against.
    root: PathBuf,
    /// Cached asset contents keyed by normalized path.
    cache: Cache<String, Bytes>,
}

impl AssetCache {
    /// Create a new asset cache from configuration.
    pub fn new(config: &AssetConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.time_to_live_seconds))
            .build();

        Self {
            root: PathBuf::from(&config.root),
            cache,
        }
    }

    /// Directory this cache reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drop a cached asset so the next read goes to disk.
    pub async fn invalidate(&self, path: &str) {
        if let Ok(key) = normalize(path) {
            self.cache.invalidate(&key).await;
        }
    }

    /// Number of cached entries (approximate until pending tasks run).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl AssetSource for AssetCache {
    async fn cat(&self, path: &str) -> AppResult<Bytes> {
        let key = normalize(path)?;
        let full = self.root.join(&key);

        self.cache
            .try_get_with(key.clone(), async move {
                debug!(path = %key, "Loading asset from disk");
                let data = tokio::fs::read(&full).await.map_err(|e| {
                    let err: AppError = e.into();
                    AppError::new(err.kind, format!("asset '{key}': {}", err.message))
                })?;
                Ok::<_, AppError>(Bytes::from(data))
            })
            .await
            .map_err(|e| (*e).clone())
    }
}

/// Turn a request path into a relative key that cannot escape the root.
fn normalize(path: &str) -> AppResult<String> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::validation("empty asset path"));
    }

    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(AppError::validation(format!(
                    "invalid asset path '{path}'"
                )));
            }
        }
    }

    if parts.is_empty() {
        return Err(AppError::validation("empty asset path"));
    }
    Ok(parts.join("/"))
}
