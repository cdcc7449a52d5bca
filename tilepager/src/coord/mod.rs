//! Tile keys for the quadtree tiling profile.
//!
//! [`TileKey`] is the key the pager uses for every tile it tracks. The generic
//! components (tracker, result cache) accept any [`ResourceKey`], so other
//! resource keys can share the same machinery.

mod types;

pub use types::{CoordError, TileKey, MAX_LEVEL};

use std::fmt::Debug;
use std::hash::Hash;

/// Bounds required of any key used by the lifecycle components.
///
/// Keys are stable for the lifetime of the resource they name; equal keys
/// denote the same logical resource.
pub trait ResourceKey: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

impl<T> ResourceKey for T where T: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

#[cfg(test)]
mod tests;
