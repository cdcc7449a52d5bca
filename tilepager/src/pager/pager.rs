//! The tile pager composition root.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::cache::{AsyncResultCache, FetchError};
use crate::coord::TileKey;
use crate::disposal::{DisposalRing, Disposer};
use crate::scheduler::{CancelableTask, PriorityTaskQueue};
use crate::tracker::{UsageToken, UsageTracker};

use super::config::PagerConfig;
use super::error::PagerError;
use super::report::{CycleReport, PagerStats, PagerTotals};
use super::slot::{PriorityCell, SlotState, TileSlot, TileState};
use super::source::{TileRequest, TileSource};

/// Result delivered back to the update thread.
enum Completion<R> {
    /// A build task produced the resource.
    Built {
        key: TileKey,
        token: UsageToken,
        resource: R,
    },
    /// The fetch failed.
    Failed {
        key: TileKey,
        token: UsageToken,
        error: FetchError,
    },
}

/// Handles needed to start loads, cloned into every queued task.
///
/// Holds the queue weakly: queued tasks own loaders, and the pager owns the
/// queue.
struct Loader<S: TileSource> {
    source: Arc<S>,
    runtime: Handle,
    cache: Arc<AsyncResultCache<TileKey, S::Data>>,
    queue: Weak<PriorityTaskQueue>,
    completions: mpsc::UnboundedSender<Completion<S::Resource>>,
}

impl<S: TileSource> Clone for Loader<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            runtime: self.runtime.clone(),
            cache: Arc::clone(&self.cache),
            queue: Weak::clone(&self.queue),
            completions: self.completions.clone(),
        }
    }
}

impl<S: TileSource> Loader<S> {
    /// Queues a task that starts the fetch for `key` when it reaches the
    /// front of the queue.
    fn enqueue_load(
        &self,
        key: TileKey,
        token: UsageToken,
        cancel: CancellationToken,
        priority: PriorityCell,
    ) {
        let Some(queue) = self.queue.upgrade() else {
            return;
        };
        let loader = self.clone();
        let supplier = priority.supplier();
        let task_cancel = cancel.clone();
        queue.enqueue(
            CancelableTask::new(task_cancel, move || {
                loader.start_fetch(key, token, cancel, priority)
            }),
            Some(supplier),
        );
    }

    /// Runs the fetch on the runtime. A success queues the build step.
    fn start_fetch(
        self,
        key: TileKey,
        token: UsageToken,
        cancel: CancellationToken,
        priority: PriorityCell,
    ) {
        trace!(key = %key, "Starting tile fetch");
        let runtime = self.runtime.clone();
        runtime.spawn(async move {
            let outcome = self
                .cache
                .get_or_fetch(key, || self.source.fetch(key))
                .await;

            match outcome {
                Ok(data) => {
                    if cancel.is_cancelled() {
                        trace!(key = %key, "Tile evicted during fetch, skipping build");
                        return;
                    }
                    self.enqueue_build(key, token, data, cancel, priority);
                }
                Err(error) => {
                    // The receiver is gone only if the pager was dropped
                    let _ = self
                        .completions
                        .send(Completion::Failed { key, token, error });
                }
            }
        });
    }

    /// Queues the build step, which runs on the update thread.
    fn enqueue_build(
        &self,
        key: TileKey,
        token: UsageToken,
        data: S::Data,
        cancel: CancellationToken,
        priority: PriorityCell,
    ) {
        let Some(queue) = self.queue.upgrade() else {
            return;
        };
        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        queue.enqueue(
            CancelableTask::new(cancel, move || {
                let resource = source.build(key, &data);
                let _ = completions.send(Completion::Built {
                    key,
                    token,
                    resource,
                });
            }),
            Some(priority.supplier()),
        );
    }
}

/// Keeps the resident tile set in step with what the visibility selector
/// wants, one [`update`](Self::update) per render cycle.
///
/// The pager is owned by the update thread. Fetches run on the tokio runtime
/// given at construction; builds run inside `update`, one task per cycle.
pub struct TilePager<S: TileSource> {
    config: PagerConfig,
    queue: Arc<PriorityTaskQueue>,
    loader: Loader<S>,
    tracker: UsageTracker<TileKey, TileSlot<S::Resource>>,
    tokens: HashMap<TileKey, UsageToken>,
    disposal: DisposalRing<S::Resource>,
    completions: mpsc::UnboundedReceiver<Completion<S::Resource>>,
    cycle: u64,
    totals: PagerTotals,
}

impl<S: TileSource> TilePager<S> {
    /// Creates a pager with its own result cache.
    pub fn new(config: PagerConfig, source: S, runtime: Handle) -> Result<Self, PagerError> {
        config.validate()?;
        let cache = Arc::new(AsyncResultCache::with_config(config.cache.clone()));
        Ok(Self::assemble(config, Arc::new(source), runtime, cache))
    }

    /// Creates a pager on the runtime the caller is running in.
    pub fn from_current_runtime(config: PagerConfig, source: S) -> Result<Self, PagerError> {
        let runtime = Handle::try_current()?;
        Self::new(config, source, runtime)
    }

    /// Creates a pager that shares `cache` (and `source`) with other pagers.
    ///
    /// `config.cache` is ignored and not validated; the shared cache keeps
    /// its own capacity.
    pub fn with_shared_cache(
        config: PagerConfig,
        source: Arc<S>,
        runtime: Handle,
        cache: Arc<AsyncResultCache<TileKey, S::Data>>,
    ) -> Result<Self, PagerError> {
        config.validate_pager()?;
        Ok(Self::assemble(config, source, runtime, cache))
    }

    fn assemble(
        config: PagerConfig,
        source: Arc<S>,
        runtime: Handle,
        cache: Arc<AsyncResultCache<TileKey, S::Data>>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Arc::new(PriorityTaskQueue::new());

        info!(
            max_evictions_per_cycle = config.max_evictions_per_cycle,
            disposal_generations = config.disposal_generations,
            cache_entries = cache.max_entries(),
            "Tile pager created"
        );

        Self {
            disposal: DisposalRing::new(config.disposal_generations),
            loader: Loader {
                source,
                runtime,
                cache,
                queue: Arc::downgrade(&queue),
                completions: tx,
            },
            queue,
            config,
            tracker: UsageTracker::new(),
            tokens: HashMap::new(),
            completions: rx,
            cycle: 0,
            totals: PagerTotals::default(),
        }
    }

    /// Hands evicted resources to `disposer` as they are evicted, instead of
    /// holding them for the configured number of generations.
    pub fn with_disposer(mut self, disposer: Disposer<S::Resource>) -> Self {
        self.disposal = DisposalRing::with_disposer(self.config.disposal_generations, disposer);
        self
    }

    /// Runs `action` at the start of the next [`update`](Self::update),
    /// outside the one-task-per-cycle budget.
    pub fn on_next_update<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.on_next_tick(action);
    }

    /// Runs one cycle against the tiles wanted this frame.
    ///
    /// Order: touch every desired tile (creating and queueing loads for new
    /// ones), run one scheduler task, install finished results, evict tiles
    /// not wanted since the previous cycle into the disposal ring, then
    /// advance the ring.
    pub fn update(&mut self, desired: &[TileRequest]) -> CycleReport {
        let mut report = CycleReport::new(self.cycle);

        for request in desired {
            self.touch(request, &mut report);
        }

        report.task = self.queue.run_one_tick();
        self.install_completions(&mut report);
        self.evict_stale(&mut report);
        report.released = self.disposal.advance();

        report.needs_redraw = report.installed > 0 || report.failed > 0 || report.evicted > 0;
        self.totals.record(&report);
        self.cycle += 1;

        if report.created > 0 || report.evicted > 0 {
            debug!(
                cycle = report.cycle,
                created = report.created,
                installed = report.installed,
                evicted = report.evicted,
                released = report.released,
                tracked = self.tracker.len(),
                "Pager cycle"
            );
        }
        report
    }

    fn touch(&mut self, request: &TileRequest, report: &mut CycleReport) {
        let key = request.key;
        let existing = self.tokens.get(&key).copied();
        let cycle = self.cycle;
        let token = self
            .tracker
            .touch(key, existing, || TileSlot::new(request.priority, cycle));

        if existing.is_some() {
            if let Some(slot) = self.tracker.get(token) {
                slot.priority.set(request.priority);
            }
            return;
        }

        self.tokens.insert(key, token);
        report.created += 1;

        let Some(slot) = self.tracker.get_mut(token) else {
            return;
        };
        match self.loader.cache.peek(&key) {
            Some(Ok(data)) => {
                trace!(key = %key, "Fetch result memoized, queueing build");
                self.loader.enqueue_build(
                    key,
                    token,
                    data,
                    slot.cancel.clone(),
                    slot.priority.clone(),
                );
            }
            Some(Err(error)) => {
                debug!(key = %key, error = %error, "Tile has a memoized failure");
                slot.state = SlotState::Failed(error);
                report.failed += 1;
            }
            None => {
                self.loader.enqueue_load(
                    key,
                    token,
                    slot.cancel.clone(),
                    slot.priority.clone(),
                );
            }
        }
    }

    fn install_completions(&mut self, report: &mut CycleReport) {
        while let Ok(completion) = self.completions.try_recv() {
            match completion {
                Completion::Built {
                    key,
                    token,
                    resource,
                } => match self.tracker.get_mut(token) {
                    Some(slot) if slot.is_pending() => {
                        trace!(key = %key, "Tile resident");
                        slot.state = SlotState::Resident(resource);
                        report.installed += 1;
                    }
                    // Evicted while building; never drawn, but it may
                    // already hold backend objects
                    _ => self.disposal.dispose(resource),
                },
                Completion::Failed { key, token, error } => match self.tracker.get_mut(token) {
                    Some(slot) if slot.is_pending() => {
                        debug!(key = %key, error = %error, "Tile fetch failed");
                        slot.state = SlotState::Failed(error);
                        report.failed += 1;
                    }
                    _ => trace!(key = %key, "Dropping failure for untracked tile"),
                },
            }
        }
    }

    fn evict_stale(&mut self, report: &mut CycleReport) {
        let evicted = self.tracker.sweep_all(self.config.max_evictions_per_cycle);
        report.evicted = evicted.len();

        for (key, slot) in evicted {
            self.tokens.remove(&key);
            let lived = self.cycle.saturating_sub(slot.created_cycle);
            if let Some(resource) = slot.retire() {
                trace!(key = %key, cycles = lived, "Evicting resident tile");
                self.disposal.dispose(resource);
            }
        }
    }

    /// The built resource for `key`, if it is resident.
    pub fn resource(&self, key: &TileKey) -> Option<&S::Resource> {
        let token = self.tokens.get(key)?;
        self.tracker.get(*token)?.resource()
    }

    /// Lifecycle state of `key`, or `None` if it is not tracked.
    pub fn state(&self, key: &TileKey) -> Option<TileState> {
        let token = self.tokens.get(key)?;
        self.tracker.get(*token).map(TileSlot::view)
    }

    /// Forgets the memoized fetch result for `key`.
    ///
    /// If the tile is tracked in the failed state it goes back to pending
    /// and its load is queued again. Returns whether a retry was queued.
    pub fn invalidate(&mut self, key: &TileKey) -> bool {
        self.loader.cache.invalidate(key);

        let Some(&token) = self.tokens.get(key) else {
            return false;
        };
        let Some(slot) = self.tracker.get_mut(token) else {
            warn!(key = %key, "Token map out of step with tracker");
            self.tokens.remove(key);
            return false;
        };
        if !matches!(slot.state, SlotState::Failed(_)) {
            return false;
        }

        debug!(key = %key, "Retrying failed tile");
        slot.state = SlotState::Pending;
        self.loader.enqueue_load(
            *key,
            token,
            slot.cancel.clone(),
            slot.priority.clone(),
        );
        true
    }

    /// Cycles completed so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn resident_count(&self) -> usize {
        self.tracker
            .iter()
            .filter(|(_, _, slot)| slot.resource().is_some())
            .count()
    }

    pub fn tracked_count(&self) -> usize {
        self.tracker.len()
    }

    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    /// The result cache, for sharing with another pager.
    pub fn cache(&self) -> &Arc<AsyncResultCache<TileKey, S::Data>> {
        &self.loader.cache
    }

    pub fn stats(&self) -> PagerStats {
        let (mut resident, mut pending, mut failed) = (0, 0, 0);
        for (_, _, slot) in self.tracker.iter() {
            match slot.state {
                SlotState::Pending => pending += 1,
                SlotState::Resident(_) => resident += 1,
                SlotState::Failed(_) => failed += 1,
            }
        }

        PagerStats {
            cycles: self.cycle,
            tracked: self.tracker.len(),
            resident,
            pending,
            failed,
            queued: self.queue.len(),
            awaiting_disposal: self.disposal.pending_count(),
            total_created: self.totals.created,
            total_installed: self.totals.installed,
            total_failed: self.totals.failed,
            total_evicted: self.totals.evicted,
            total_released: self.totals.released,
            cache: self.loader.cache.stats(),
            scheduler: self.queue.stats(),
        }
    }

    /// Logs current statistics.
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            cycles = stats.cycles,
            tracked = stats.tracked,
            resident = stats.resident,
            pending = stats.pending,
            failed = stats.failed,
            queued = stats.queued,
            awaiting_disposal = stats.awaiting_disposal,
            total_evicted = stats.total_evicted,
            "Tile pager statistics"
        );
        self.loader.cache.log_stats();
    }
}

impl<S: TileSource> Drop for TilePager<S> {
    fn drop(&mut self) {
        // Fetches still in flight on the runtime skip their build step
        for (_, _, slot) in self.tracker.iter() {
            slot.cancel.cancel();
        }
        debug!(
            cycles = self.cycle,
            tracked = self.tracker.len(),
            "Tile pager dropped"
        );
    }
}
