//! Asset retrieval trait.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Source of opaque asset bytes addressed by a slash-separated path.
///
/// The HTTP layer relays the bytes untouched and reports failures
/// verbatim to the caller.
#[async_trait]
pub trait AssetSource: Send + Sync + std::fmt::Debug + 'static {
    /// Return the full contents of the asset at `path`.
    async fn cat(&self, path: &str) -> AppResult<Bytes>;
}
