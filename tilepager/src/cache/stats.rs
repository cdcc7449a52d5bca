//! Result cache statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared between the cache and its eviction listener.
#[derive(Debug, Default)]
pub(crate) struct ResultCacheCounters {
    pub(crate) hits: AtomicU64,
    pub(crate) fetches: AtomicU64,
    pub(crate) coalesced: AtomicU64,
    pub(crate) failures: AtomicU64,
    pub(crate) evictions: AtomicU64,
}

impl ResultCacheCounters {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ResultCacheStats {
        ResultCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of result cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultCacheStats {
    /// Lookups answered from the memo
    pub hits: u64,
    /// Fetches actually started
    pub fetches: u64,
    /// Lookups that waited on another caller's fetch
    pub coalesced: u64,
    /// Fetches that completed with a failure
    pub failures: u64,
    /// Entries evicted to stay within capacity
    pub evictions: u64,
}

impl ResultCacheStats {
    /// Total lookups observed.
    pub fn lookups(&self) -> u64 {
        self.hits + self.fetches + self.coalesced
    }

    /// Fraction of lookups that did not start a fetch (0.0 to 1.0).
    pub fn hit_ratio(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            (self.hits + self.coalesced) as f64 / total as f64
        }
    }

    /// Fraction of lookups that joined an in-flight fetch (0.0 to 1.0).
    pub fn coalescing_ratio(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            self.coalesced as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios_with_no_lookups() {
        let stats = ResultCacheStats::default();
        assert_eq!(stats.hit_ratio(), 0.0);
        assert_eq!(stats.coalescing_ratio(), 0.0);
    }

    #[test]
    fn test_ratios() {
        let stats = ResultCacheStats {
            hits: 2,
            fetches: 1,
            coalesced: 1,
            failures: 0,
            evictions: 0,
        };
        assert_eq!(stats.lookups(), 4);
        assert!((stats.hit_ratio() - 0.75).abs() < 0.001);
        assert!((stats.coalescing_ratio() - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_snapshot_reads_counters() {
        let counters = ResultCacheCounters::default();
        ResultCacheCounters::bump(&counters.hits);
        ResultCacheCounters::bump(&counters.hits);
        ResultCacheCounters::bump(&counters.failures);

        let stats = counters.snapshot();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.fetches, 0);
    }
}
