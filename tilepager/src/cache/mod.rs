//! Keyed memoization of fetch outcomes with single-flight semantics.
//!
//! [`AsyncResultCache`] remembers the outcome of a fetch per key, successes
//! and failures alike, so a tile whose source is unreachable is not fetched
//! over and over. Concurrent requests for the same key are coalesced: only
//! one caller runs the fetch and every other caller receives its result.
//!
//! # Architecture
//!
//! ```text
//! Caller A ─┐                                   fetch()
//!           │                                     │
//! Caller B ─┼──► AsyncResultCache ──► leader ─────┘
//!           │        │     ▲                      │
//! Caller C ─┘        │     └── memo (moka, LRU) ◄─┘
//!                    ▼
//!              [B, C wait on the
//!               leader's broadcast]
//! ```
//!
//! The memo is bounded by entry count and evicts least-recently-used
//! entries. A memoized failure stays until it is evicted or the key is
//! explicitly invalidated.

mod result_cache;
mod stats;
mod types;

pub use result_cache::AsyncResultCache;
pub use stats::ResultCacheStats;
pub use types::{
    CachedResult, FetchError, FetchErrorKind, ResultCacheConfig, DEFAULT_RESULT_CACHE_CAPACITY,
};
