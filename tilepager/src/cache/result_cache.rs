//! Single-flight memoizing cache.
//!
//! # Concurrency
//!
//! The in-flight map and the memo are consulted under one short-lived lock,
//! so a key is either memoized, being fetched by exactly one leader, or
//! absent. A caller that finds a fetch in flight subscribes to the leader's
//! broadcast channel and waits; it never starts a second fetch.
//!
//! If the leader goes away before finishing (its future is dropped), the
//! in-flight marker is cleared and the channel closes. Waiters then contend
//! again and one of them becomes the new leader.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::stats::{ResultCacheCounters, ResultCacheStats};
use super::types::{CachedResult, ResultCacheConfig};
use crate::coord::ResourceKey;

/// Outcome of registering interest in a key.
enum Registration<V> {
    /// Memoized result available
    Ready(CachedResult<V>),
    /// Caller must fetch and complete
    Leader,
    /// Another caller is fetching; wait on this receiver
    Waiter(broadcast::Receiver<CachedResult<V>>),
}

/// Keyed, bounded memo of fetch outcomes with at most one fetch per key.
///
/// Safe to share across threads (`Arc<AsyncResultCache<_, _>>`). Pass one
/// instance to several pagers to let them share memoized results; give each
/// its own to keep them independent.
pub struct AsyncResultCache<K, V>
where
    K: ResourceKey,
    V: Clone + Send + Sync + 'static,
{
    memo: moka::sync::Cache<K, CachedResult<V>>,
    in_flight: Mutex<HashMap<K, broadcast::Sender<CachedResult<V>>>>,
    counters: Arc<ResultCacheCounters>,
    max_entries: u64,
}

impl<K, V> AsyncResultCache<K, V>
where
    K: ResourceKey,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache holding at most `max_entries` results.
    pub fn new(max_entries: u64) -> Self {
        Self::with_config(ResultCacheConfig::new(max_entries))
    }

    pub fn with_config(config: ResultCacheConfig) -> Self {
        let counters = Arc::new(ResultCacheCounters::default());
        let listener_counters = Arc::clone(&counters);

        let memo = moka::sync::Cache::builder()
            .max_capacity(config.max_entries)
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(move |_key, _value, cause| {
                if cause == RemovalCause::Size {
                    ResultCacheCounters::bump(&listener_counters.evictions);
                }
            })
            .build();

        Self {
            memo,
            in_flight: Mutex::new(HashMap::new()),
            counters,
            max_entries: config.max_entries,
        }
    }

    /// Returns the memoized result for `key`, fetching it if needed.
    ///
    /// `fetch` is invoked only if no result is memoized and no other caller
    /// is already fetching this key. Its outcome, success or failure, is
    /// memoized before being returned to every waiting caller.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> CachedResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CachedResult<V>>,
    {
        loop {
            match self.register(&key) {
                Registration::Ready(result) => return result,
                Registration::Leader => break,
                Registration::Waiter(mut rx) => {
                    if let Ok(result) = rx.recv().await {
                        return result;
                    }
                    debug!(key = ?key, "Leader abandoned fetch, contending again");
                }
            }
        }

        let mut guard = LeaderGuard::new(self, &key);
        let outcome = fetch().await;
        guard.complete(&outcome);
        outcome
    }

    /// Blocking form of [`get_or_fetch`](Self::get_or_fetch) for plain
    /// worker threads.
    ///
    /// Waiting callers block their thread. Must not be called from within an
    /// async runtime.
    pub fn get_or_fetch_blocking<F>(&self, key: K, fetch: F) -> CachedResult<V>
    where
        F: FnOnce() -> CachedResult<V>,
    {
        loop {
            match self.register(&key) {
                Registration::Ready(result) => return result,
                Registration::Leader => break,
                Registration::Waiter(mut rx) => {
                    if let Ok(result) = rx.blocking_recv() {
                        return result;
                    }
                    debug!(key = ?key, "Leader abandoned fetch, contending again");
                }
            }
        }

        let mut guard = LeaderGuard::new(self, &key);
        let outcome = fetch();
        guard.complete(&outcome);
        outcome
    }

    /// Returns the memoized result without fetching.
    pub fn peek(&self, key: &K) -> Option<CachedResult<V>> {
        self.memo.get(key)
    }

    /// Forgets the memoized result for `key` so the next lookup fetches.
    ///
    /// A fetch already in flight is unaffected. Lookups made after this call
    /// join it, and its result is memoized when it completes.
    pub fn invalidate(&self, key: &K) {
        self.memo.invalidate(key);
    }

    /// Forgets every memoized result.
    pub fn clear(&self) {
        self.memo.invalidate_all();
        self.memo.run_pending_tasks();
    }

    /// Number of memoized results.
    ///
    /// Eviction is applied lazily; call
    /// [`run_pending_tasks`](Self::run_pending_tasks) first for an exact
    /// figure.
    pub fn entry_count(&self) -> u64 {
        self.memo.entry_count()
    }

    /// Applies pending evictions and invalidations.
    pub fn run_pending_tasks(&self) {
        self.memo.run_pending_tasks();
    }

    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    /// Number of keys currently being fetched.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.lock().contains_key(key)
    }

    pub fn stats(&self) -> ResultCacheStats {
        self.counters.snapshot()
    }

    /// Logs current statistics.
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            hits = stats.hits,
            fetches = stats.fetches,
            coalesced = stats.coalesced,
            failures = stats.failures,
            evictions = stats.evictions,
            entries = self.entry_count(),
            in_flight = self.in_flight_count(),
            hit_ratio = format!("{:.1}%", stats.hit_ratio() * 100.0),
            "Result cache statistics"
        );
    }

    fn register(&self, key: &K) -> Registration<V> {
        let mut in_flight = self.in_flight.lock();

        if let Some(result) = self.memo.get(key) {
            ResultCacheCounters::bump(&self.counters.hits);
            return Registration::Ready(result);
        }

        if let Some(tx) = in_flight.get(key) {
            ResultCacheCounters::bump(&self.counters.coalesced);
            debug!(key = ?key, "Coalescing lookup with in-flight fetch");
            return Registration::Waiter(tx.subscribe());
        }

        // One message is ever sent per channel
        let (tx, _rx) = broadcast::channel(1);
        in_flight.insert(key.clone(), tx);
        ResultCacheCounters::bump(&self.counters.fetches);
        debug!(
            key = ?key,
            in_flight_count = in_flight.len(),
            "Starting fetch"
        );
        Registration::Leader
    }

    fn complete(&self, key: &K, outcome: &CachedResult<V>) {
        if outcome.is_err() {
            ResultCacheCounters::bump(&self.counters.failures);
        }

        // Memoize before clearing the in-flight marker so no lookup can slip
        // between the two and start a second fetch.
        let sender = {
            let mut in_flight = self.in_flight.lock();
            self.memo.insert(key.clone(), outcome.clone());
            in_flight.remove(key)
        };

        if let Some(tx) = sender {
            let waiters = tx.receiver_count();
            // Err only means nobody is waiting
            let _ = tx.send(outcome.clone());
            if waiters > 0 {
                debug!(key = ?key, waiters, "Broadcast result to coalesced waiters");
            }
        }
    }

    fn abandon(&self, key: &K) {
        // Dropping the sender closes the channel and wakes waiters
        let sender = self.in_flight.lock().remove(key);
        if sender.is_some() {
            debug!(key = ?key, "Fetch abandoned before completion");
        }
    }
}

/// Clears the in-flight marker if the leader stops before completing.
struct LeaderGuard<'a, K, V>
where
    K: ResourceKey,
    V: Clone + Send + Sync + 'static,
{
    cache: &'a AsyncResultCache<K, V>,
    key: &'a K,
    completed: bool,
}

impl<'a, K, V> LeaderGuard<'a, K, V>
where
    K: ResourceKey,
    V: Clone + Send + Sync + 'static,
{
    fn new(cache: &'a AsyncResultCache<K, V>, key: &'a K) -> Self {
        Self {
            cache,
            key,
            completed: false,
        }
    }

    fn complete(&mut self, outcome: &CachedResult<V>) {
        self.cache.complete(self.key, outcome);
        self.completed = true;
    }
}

impl<K, V> Drop for LeaderGuard<'_, K, V>
where
    K: ResourceKey,
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if !self.completed {
            self.cache.abandon(self.key);
        }
    }
}
