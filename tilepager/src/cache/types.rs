//! Core types for the result cache.

use std::fmt;

use thiserror::Error;

/// Default number of memoized results (matches the content cache size the
/// terrain engine has always used).
pub const DEFAULT_RESULT_CACHE_CAPACITY: u64 = 128;

/// Memoized outcome of a fetch.
pub type CachedResult<V> = Result<V, FetchError>;

/// Broad category of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The source has no data for this key (e.g. beyond its deepest level)
    ResourceUnavailable,
    /// The source could not be reached or refused the request
    ServiceUnavailable,
    /// Bytes arrived but could not be interpreted
    InvalidData,
    /// Anything else
    Other,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchErrorKind::ResourceUnavailable => "Resource unavailable",
            FetchErrorKind::ServiceUnavailable => "Service unavailable",
            FetchErrorKind::InvalidData => "Invalid data",
            FetchErrorKind::Other => "Fetch failed",
        };
        f.write_str(name)
    }
}

/// A failed fetch.
///
/// `Clone` because the same failure is handed to every coalesced caller and
/// kept in the memo.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    /// Failure category.
    pub kind: FetchErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The source has nothing for this key.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::ResourceUnavailable, message)
    }

    /// The source could not be reached.
    pub fn service(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::ServiceUnavailable, message)
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::InvalidData, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Other, message)
    }

    /// Whether a later retry (after invalidation) might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, FetchErrorKind::ServiceUnavailable)
    }
}

/// Result cache configuration.
#[derive(Debug, Clone)]
pub struct ResultCacheConfig {
    /// Maximum number of memoized results (default: 128)
    pub max_entries: u64,
}

impl Default for ResultCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_RESULT_CACHE_CAPACITY,
        }
    }
}

impl ResultCacheConfig {
    pub fn new(max_entries: u64) -> Self {
        Self { max_entries }
    }
}
