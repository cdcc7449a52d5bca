//! Pager error types.

use thiserror::Error;

/// Errors raised while constructing a pager.
///
/// Ordinary runtime failures (a tile that cannot be fetched, a canceled
/// task) are not errors; they surface as [`TileState`](super::TileState)
/// values and [`CycleReport`](super::CycleReport) counts.
#[derive(Debug, Error)]
pub enum PagerError {
    /// A configuration value the pager cannot run with
    #[error("Invalid pager configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// No tokio runtime to run fetches on
    #[error("No async runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
