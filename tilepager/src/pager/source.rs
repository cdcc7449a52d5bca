//! Contracts with the data and render backends.

use std::future::Future;

use crate::cache::CachedResult;
use crate::coord::TileKey;

/// Supplies tile content to a [`TilePager`](super::TilePager).
///
/// Loading is two-phase. [`fetch`](Self::fetch) produces backend-neutral
/// data (bytes, decoded rasters, heightfields) and runs on the async runtime;
/// its outcome is memoized per key. [`build`](Self::build) turns that data
/// into a render resource and runs on the update thread, since compile and
/// upload steps are bound to it.
pub trait TileSource: Send + Sync + 'static {
    /// Memoized fetch output, shared by every pager using the same cache.
    type Data: Clone + Send + Sync + 'static;

    /// Render-bound object. Dropping it releases its backend resources.
    type Resource: Send + 'static;

    /// Fetches the data for `key`.
    ///
    /// Failures must be reported as `Err`; they are memoized and the key is
    /// not fetched again until invalidated. Any timeout policy belongs here.
    fn fetch(&self, key: TileKey) -> impl Future<Output = CachedResult<Self::Data>> + Send;

    /// Builds the render resource for `key` from fetched data.
    fn build(&self, key: TileKey, data: &Self::Data) -> Self::Resource;
}

/// One tile the visibility selector wants resident this cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRequest {
    pub key: TileKey,
    /// View-dependent urgency. Higher loads sooner.
    pub priority: f32,
}

impl TileRequest {
    pub fn new(key: TileKey, priority: f32) -> Self {
        Self { key, priority }
    }
}
