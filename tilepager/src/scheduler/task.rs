//! Task abstractions for the priority queue.

use tokio_util::sync::CancellationToken;

/// Priority supplier, evaluated once per cycle. Higher runs sooner.
pub type PriorityFn = Box<dyn Fn() -> f32 + Send>;

/// Capability to report that queued work is no longer wanted.
pub trait Cancelable {
    fn is_canceled(&self) -> bool;
}

impl Cancelable for CancellationToken {
    fn is_canceled(&self) -> bool {
        self.is_cancelled()
    }
}

/// A unit of work run on the update thread.
pub trait UpdateTask: Send + 'static {
    /// Runs the task, consuming it.
    fn run(self: Box<Self>);

    /// Cancellation probe checked before the task runs, if it has one.
    fn cancelable(&self) -> Option<&dyn Cancelable> {
        None
    }
}

/// Closure task without cancellation.
pub struct FnTask<F>(pub F);

impl<F> UpdateTask for FnTask<F>
where
    F: FnOnce() + Send + 'static,
{
    fn run(self: Box<Self>) {
        (self.0)()
    }
}

/// Closure task discarded if its token is canceled before it runs.
pub struct CancelableTask<F> {
    token: CancellationToken,
    action: F,
}

impl<F> CancelableTask<F>
where
    F: FnOnce() + Send + 'static,
{
    pub fn new(token: CancellationToken, action: F) -> Self {
        Self { token, action }
    }
}

impl<F> UpdateTask for CancelableTask<F>
where
    F: FnOnce() + Send + 'static,
{
    fn run(self: Box<Self>) {
        (self.action)()
    }

    fn cancelable(&self) -> Option<&dyn Cancelable> {
        Some(&self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fn_task_runs_closure() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let task: Box<dyn UpdateTask> = Box::new(FnTask(move || flag.store(true, Ordering::SeqCst)));

        assert!(task.cancelable().is_none());
        task.run();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancelable_task_reports_token_state() {
        let token = CancellationToken::new();
        let task = CancelableTask::new(token.clone(), || {});

        let probe = task.cancelable().unwrap();
        assert!(!probe.is_canceled());
        token.cancel();
        assert!(probe.is_canceled());
    }

    #[test]
    fn test_child_token_cancellation_propagates() {
        let parent = CancellationToken::new();
        let task = CancelableTask::new(parent.child_token(), || {});

        parent.cancel();
        assert!(task.cancelable().unwrap().is_canceled());
    }
}
