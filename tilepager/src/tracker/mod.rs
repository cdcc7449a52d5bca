//! Per-cycle usage tracking for bulk eviction.
//!
//! The tracker answers one question at the end of every render cycle: which
//! entries were *not* used since the previous sweep? Visible tiles are
//! touched each cycle; everything else becomes a candidate for eviction.
//!
//! # Implementation
//!
//! Entries live in a generational arena (`slotmap`). Each entry carries the
//! cycle number of its last touch, and a sweep offers every entry stamped
//! with an older cycle. The public [`UsageToken`] is the arena key (slot +
//! generation), so a token that outlives its entry can never alias a newer
//! entry that reused the slot.
//!
//! ```text
//!  cycle N                          sweep (end of N)
//!  touch(A) touch(C)  ──────────►   A.touched == N  keep
//!                                   B.touched <  N  offer to disposer
//!                                   C.touched == N  keep
//!                                   cycle = N + 1
//! ```

mod usage;

pub use usage::{UsageToken, UsageTracker};
