//! One-task-per-cycle priority queue.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use super::task::{FnTask, PriorityFn, UpdateTask};

/// A queued task with its scheduling metadata.
struct PendingTask {
    task: Box<dyn UpdateTask>,
    priority: Option<PriorityFn>,
    /// Enqueue order, for FIFO tie-breaking.
    seq: u64,
}

/// One-shot action run at the start of the next tick.
type DeferredFn = Box<dyn FnOnce() + Send>;

/// Tasks taken out of the queue for one tick.
///
/// Whatever is still held when it drops goes back to the queue, including
/// on unwind out of a priority function or cancellation check.
struct TickBatch<'a> {
    queue: &'a PriorityTaskQueue,
    unranked: Vec<PendingTask>,
    ranked: Vec<(Option<f32>, PendingTask)>,
}

impl Drop for TickBatch<'_> {
    fn drop(&mut self) {
        if self.unranked.is_empty() && self.ranked.is_empty() {
            return;
        }
        let mut pending = self.queue.pending.lock();
        pending.append(&mut self.unranked);
        pending.extend(self.ranked.drain(..).map(|(_, task)| task));
    }
}

/// What a call to [`PriorityTaskQueue::run_one_tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was queued.
    Idle,
    /// Every queued task had been canceled; all were discarded.
    Drained { discarded: usize },
    /// One task ran, after discarding `discarded` canceled ones.
    Executed { discarded: usize },
}

impl TickOutcome {
    pub fn executed(&self) -> bool {
        matches!(self, TickOutcome::Executed { .. })
    }

    pub fn discarded(&self) -> usize {
        match self {
            TickOutcome::Idle => 0,
            TickOutcome::Drained { discarded } | TickOutcome::Executed { discarded } => *discarded,
        }
    }
}

/// Scheduling state as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing pending; ticks are no-ops.
    Idle,
    /// At least one task pending.
    Scheduled,
}

/// Cumulative queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub enqueued: u64,
    pub executed: u64,
    pub discarded: u64,
}

/// Priority-ordered queue drained one task per update cycle.
///
/// `enqueue` may be called from any thread. `run_one_tick` belongs to the
/// update thread and must not be called concurrently with itself. The lock
/// is held only while the pending list is mutated. Priority functions,
/// cancellation probes and task bodies all run outside it, so a task may
/// enqueue more work.
pub struct PriorityTaskQueue {
    pending: Mutex<Vec<PendingTask>>,
    deferred: Mutex<Vec<DeferredFn>>,
    next_seq: AtomicU64,
    executed: AtomicU64,
    discarded: AtomicU64,
}

impl PriorityTaskQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            deferred: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Queues a task. Without a priority function the task sorts lowest.
    pub fn enqueue<T>(&self, task: T, priority: Option<PriorityFn>)
    where
        T: UpdateTask,
    {
        self.push(Box::new(task), priority);
    }

    /// Queues a boxed task.
    pub fn enqueue_boxed(&self, task: Box<dyn UpdateTask>, priority: Option<PriorityFn>) {
        self.push(task, priority);
    }

    /// Queues a closure without a cancellation probe.
    pub fn enqueue_fn<F>(&self, action: F, priority: Option<PriorityFn>)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Box::new(FnTask(action)), priority);
    }

    fn push(&self, task: Box<dyn UpdateTask>, priority: Option<PriorityFn>) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.pending.lock().push(PendingTask {
            task,
            priority,
            seq,
        });
    }

    /// Runs the highest-priority task that has not been canceled.
    ///
    /// Deferred actions from [`on_next_tick`](Self::on_next_tick) run first
    /// and do not count against the one-task budget. Priorities are evaluated
    /// once per call. Canceled tasks encountered on the way are dropped
    /// without running. At most one task runs.
    ///
    /// If a priority function or cancellation check panics, only the task it
    /// belongs to is lost. The rest stay queued.
    pub fn run_one_tick(&self) -> TickOutcome {
        self.run_deferred();

        let mut batch = TickBatch {
            queue: self,
            unranked: std::mem::take(&mut *self.pending.lock()),
            ranked: Vec::new(),
        };
        if batch.unranked.is_empty() {
            return TickOutcome::Idle;
        }

        while let Some(pending) = batch.unranked.pop() {
            let priority = pending
                .priority
                .as_ref()
                .map(|priority_fn| priority_fn())
                .filter(|p| !p.is_nan());
            batch.ranked.push((priority, pending));
        }

        // Ascending, so the best candidate is at the tail. Equal priorities
        // put the earliest enqueued task last to pop it first.
        batch.ranked.sort_by(|(pa, a), (pb, b)| {
            compare_priority(*pa, *pb).then_with(|| b.seq.cmp(&a.seq))
        });

        let mut discarded = 0;
        let mut selected = None;
        while let Some((_, pending)) = batch.ranked.pop() {
            let canceled = pending
                .task
                .cancelable()
                .is_some_and(|probe| probe.is_canceled());
            if canceled {
                discarded += 1;
                continue;
            }
            selected = Some(pending);
            break;
        }

        // Puts the unselected tasks back before the selected one runs
        drop(batch);
        self.discarded.fetch_add(discarded as u64, Ordering::Relaxed);

        match selected {
            Some(pending) => {
                trace!(seq = pending.seq, discarded, "Running update task");
                pending.task.run();
                self.executed.fetch_add(1, Ordering::Relaxed);
                TickOutcome::Executed { discarded }
            }
            None => {
                trace!(discarded, "All queued update tasks were canceled");
                TickOutcome::Drained { discarded }
            }
        }
    }

    /// Queues `action` to run at the start of the next tick, ahead of and in
    /// addition to that tick's task.
    pub fn on_next_tick<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.deferred.lock().push(Box::new(action));
    }

    /// Runs every deferred action queued before this call.
    fn run_deferred(&self) {
        let actions = std::mem::take(&mut *self.deferred.lock());
        if actions.is_empty() {
            return;
        }
        trace!(count = actions.len(), "Running deferred update actions");
        for action in actions {
            action();
        }
    }

    /// Number of queued tasks, canceled ones included.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn state(&self) -> QueueState {
        if self.is_empty() {
            QueueState::Idle
        } else {
            QueueState::Scheduled
        }
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.next_seq.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

impl Default for PriorityTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Orders priorities with "none" below every real value.
fn compare_priority(a: Option<f32>, b: Option<f32>) -> CmpOrdering {
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(CmpOrdering::Equal),
    }
}
