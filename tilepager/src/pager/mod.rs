//! Tile residency driven by a per-cycle visibility set.
//!
//! [`TilePager`] composes the other components of this crate. Each cycle the
//! host hands it the tiles it wants drawn; the pager keeps those tiles
//! tracked, loads the missing ones in priority order and retires the ones
//! nobody asked for, deferring their destruction until in-flight frames are
//! done with them.
//!
//! # Architecture
//!
//! ```text
//!  visibility selector
//!         │ [TileRequest { key, priority }]
//!         ▼
//!  ┌──────────────┐ touch  ┌──────────────┐
//!  │  TilePager   ├───────►│ UsageTracker │── sweep ──► DisposalRing
//!  │  ::update()  │        └──────────────┘               │ advance()
//!  └──────┬───────┘                                       ▼
//!         │ enqueue load / build                  resources dropped
//!         ▼
//!  ┌───────────────────┐ load task ┌──────────────────┐
//!  │ PriorityTaskQueue ├──────────►│ AsyncResultCache │── TileSource::fetch
//!  │ (one task/cycle)  │◄──────────┤ (tokio runtime)  │     (runtime)
//!  └───────────────────┘ build task└──────────────────┘
//!         │ TileSource::build (update thread)
//!         ▼
//!     Resident
//! ```
//!
//! # Tile lifecycle
//!
//! `Pending` → fetch memoized → build → `Resident`, or `Pending` →
//! `Failed`. A failed tile stays failed until [`TilePager::invalidate`] is
//! called for it. A tile absent from the desired set for a whole cycle is
//! evicted; queued work for it is canceled and its resource, if built, goes
//! to the disposal ring.

mod config;
mod error;
#[allow(clippy::module_inception)]
mod pager;
mod report;
mod slot;
mod source;

pub use config::{PagerConfig, DEFAULT_MAX_EVICTIONS_PER_CYCLE};
pub use error::PagerError;
pub use pager::TilePager;
pub use report::{CycleReport, PagerStats};
pub use slot::TileState;
pub use source::{TileRequest, TileSource};
