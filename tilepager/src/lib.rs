//! tilepager - Tile resource lifecycle engine
//!
//! Keeps a bounded working set of render resources for a tiled, interactively
//! navigated surface in step with a camera-driven visibility set.
//!
//! # Components
//!
//! - [`tracker`]: which tiles were used this cycle, and sweeps of the rest
//! - [`cache`]: memoized fetch outcomes with at most one fetch per key
//! - [`scheduler`]: priority queue running one task per cycle
//! - [`disposal`]: multi-generation deferred destruction
//! - [`pager`]: the per-cycle composition of all four
//!
//! # High-Level API
//!
//! ```ignore
//! use tilepager::pager::{PagerConfig, TilePager, TileRequest};
//!
//! let mut pager = TilePager::new(PagerConfig::default(), source, runtime.handle().clone())?;
//!
//! // Once per frame, on the render thread
//! let report = pager.update(&selector.visible_tiles());
//! if report.needs_redraw {
//!     request_frame();
//! }
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod disposal;
pub mod logging;
pub mod pager;
pub mod scheduler;
pub mod tracker;

/// Version of the tilepager library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
