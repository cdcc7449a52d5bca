//! Deferred destruction of render-bound objects.
//!
//! An object handed to [`DisposalRing::dispose`] is not dropped right away:
//! frames already submitted to the GPU may still reference it. The ring holds
//! it for a fixed number of cycles and drops it when its generation comes
//! round again.
//!
//! ```text
//!           newest                          oldest
//!             │                               │
//!   dispose ─►[g3]  [g2]  [g1]  ...  [g5]  [g4]──► advance(): drop all,
//!             ▲                                    slot becomes newest
//!             └────────────────────────────────────┘
//! ```
//!
//! With `N` generations, an object disposed during cycle `t` is dropped by
//! the `advance()` of cycle `t + N - 1`.
//!
//! A host that manages lifetimes itself can install a [`Disposer`] with
//! [`DisposalRing::with_disposer`]; objects then go straight to it.

mod ring;

pub use ring::{DisposalRing, Disposer, DEFAULT_DISPOSAL_GENERATIONS};
