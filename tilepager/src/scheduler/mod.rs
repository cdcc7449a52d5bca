//! Per-cycle priority scheduling of update work.
//!
//! [`PriorityTaskQueue`] sits in the host's update phase and runs **one**
//! task per cycle: the one with the highest priority at the moment the cycle
//! runs.
//!
//! # Core Concepts
//!
//! - **Task**: anything implementing [`UpdateTask`]. Closures are wrapped with
//!   [`FnTask`] or [`CancelableTask`].
//!
//! - **Priority**: an optional closure re-evaluated every cycle, so a task's
//!   urgency can follow the camera. Tasks without one always run last.
//!
//! - **Cancellation**: cooperative. A queued task that exposes a
//!   [`Cancelable`] probe reporting "canceled" is dropped when it reaches the
//!   front instead of running. A task already running is never interrupted.
//!
//! - **Deferred actions**: closures passed to
//!   [`PriorityTaskQueue::on_next_tick`] all run at the start of the next
//!   cycle, outside the one-task budget.
//!
//! # Example
//!
//! ```
//! use tilepager::scheduler::{PriorityTaskQueue, TickOutcome};
//!
//! let queue = PriorityTaskQueue::new();
//! queue.enqueue_fn(|| println!("low"), Some(Box::new(|| 1.0)));
//! queue.enqueue_fn(|| println!("high"), Some(Box::new(|| 5.0)));
//!
//! // Runs "high" only
//! assert!(matches!(queue.run_one_tick(), TickOutcome::Executed { .. }));
//! assert_eq!(queue.len(), 1);
//! ```

mod queue;
mod task;

pub use queue::{PriorityTaskQueue, QueueState, QueueStats, TickOutcome};
pub use task::{Cancelable, CancelableTask, FnTask, PriorityFn, UpdateTask};
