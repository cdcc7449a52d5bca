//! Per-cycle reports and cumulative pager statistics.

use crate::cache::ResultCacheStats;
use crate::scheduler::{QueueStats, TickOutcome};

/// What one call to [`TilePager::update`](super::TilePager::update) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Index of the cycle this report describes, starting at 0.
    pub cycle: u64,
    /// Tiles that became resident.
    pub installed: usize,
    /// Tiles whose fetch failed (memoized failures included).
    pub failed: usize,
    /// Tiles seen for the first time.
    pub created: usize,
    /// Stale tiles evicted.
    pub evicted: usize,
    /// Resources dropped by the disposal ring.
    pub released: usize,
    /// Outcome of the scheduler tick.
    pub task: TickOutcome,
    /// The visible tile set changed and the host should draw a new frame.
    pub needs_redraw: bool,
}

impl CycleReport {
    pub(crate) fn new(cycle: u64) -> Self {
        Self {
            cycle,
            installed: 0,
            failed: 0,
            created: 0,
            evicted: 0,
            released: 0,
            task: TickOutcome::Idle,
            needs_redraw: false,
        }
    }
}

/// Running totals across cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PagerTotals {
    pub created: u64,
    pub installed: u64,
    pub failed: u64,
    pub evicted: u64,
    pub released: u64,
}

impl PagerTotals {
    pub(crate) fn record(&mut self, report: &CycleReport) {
        self.created += report.created as u64;
        self.installed += report.installed as u64;
        self.failed += report.failed as u64;
        self.evicted += report.evicted as u64;
        self.released += report.released as u64;
    }
}

/// Snapshot of a pager's state.
#[derive(Debug, Clone, Copy)]
pub struct PagerStats {
    /// Cycles completed
    pub cycles: u64,
    /// Tiles currently tracked
    pub tracked: usize,
    pub resident: usize,
    pub pending: usize,
    pub failed: usize,
    /// Tasks waiting in the scheduler
    pub queued: usize,
    /// Resources waiting in the disposal ring
    pub awaiting_disposal: usize,
    pub total_created: u64,
    pub total_installed: u64,
    pub total_failed: u64,
    pub total_evicted: u64,
    pub total_released: u64,
    pub cache: ResultCacheStats,
    pub scheduler: QueueStats,
}
