//! Fixed-size ring of disposal generations.

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, warn};

/// Generations held before an object is dropped.
pub const DEFAULT_DISPOSAL_GENERATIONS: usize = 8;

/// Replaces deferred dropping: receives each disposed object immediately.
pub type Disposer<T> = Box<dyn Fn(T) + Send + Sync>;

struct RingState<T> {
    generations: Vec<Vec<T>>,
    /// Slot receiving newly disposed objects.
    newest: usize,
}

/// N-generation deferred-drop queue.
///
/// `dispose` may be called from any thread. `advance` is called once per
/// cycle by the update thread, after the cycle's own disposals.
///
/// A ring built [`with_disposer`](Self::with_disposer) hands objects to the
/// disposer instead of holding them.
pub struct DisposalRing<T> {
    state: Mutex<RingState<T>>,
    disposer: Option<Disposer<T>>,
}

impl<T> DisposalRing<T> {
    /// Creates a ring with `generations` slots.
    ///
    /// A count of zero is raised to one, which drops objects on the next
    /// `advance`.
    pub fn new(generations: usize) -> Self {
        let generations = if generations == 0 {
            warn!(
                requested = generations,
                using = 1,
                "Disposal generation count must be at least 1"
            );
            1
        } else {
            generations
        };

        let slots = (0..generations).map(|_| Vec::new()).collect();
        Self {
            state: Mutex::new(RingState {
                generations: slots,
                newest: generations - 1,
            }),
            disposer: None,
        }
    }

    /// Creates a ring that passes every disposed object to `disposer` on
    /// the calling thread. The generations stay empty.
    pub fn with_disposer(generations: usize, disposer: Disposer<T>) -> Self {
        Self {
            disposer: Some(disposer),
            ..Self::new(generations)
        }
    }

    /// Queues `object` in the newest generation.
    pub fn dispose(&self, object: T) {
        if let Some(disposer) = &self.disposer {
            disposer(object);
            return;
        }
        let mut state = self.state.lock();
        let newest = state.newest;
        state.generations[newest].push(object);
    }

    /// Queues every object from `objects` in the newest generation.
    pub fn dispose_all<I>(&self, objects: I)
    where
        I: IntoIterator<Item = T>,
    {
        if let Some(disposer) = &self.disposer {
            for object in objects {
                disposer(object);
            }
            return;
        }
        let mut state = self.state.lock();
        let newest = state.newest;
        state.generations[newest].extend(objects);
    }

    /// Drops the oldest generation and makes its slot the newest.
    ///
    /// Returns the number of objects dropped. Destructors run after the lock
    /// is released, so they may dispose further objects.
    pub fn advance(&self) -> usize {
        let released = {
            let mut state = self.state.lock();
            let oldest = (state.newest + 1) % state.generations.len();
            state.newest = oldest;
            std::mem::take(&mut state.generations[oldest])
        };

        let count = released.len();
        drop(released);
        if count > 0 {
            debug!(released = count, "Released disposal generation");
        }
        count
    }

    /// Drops every held object immediately, returning how many were held.
    pub fn flush(&self) -> usize {
        let released: Vec<Vec<T>> = {
            let mut state = self.state.lock();
            state.generations.iter_mut().map(std::mem::take).collect()
        };
        released.iter().map(Vec::len).sum()
    }

    /// Objects waiting to be dropped.
    pub fn pending_count(&self) -> usize {
        self.state.lock().generations.iter().map(Vec::len).sum()
    }

    pub fn generations(&self) -> usize {
        self.state.lock().generations.len()
    }
}

impl<T> Default for DisposalRing<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DISPOSAL_GENERATIONS)
    }
}

impl<T> fmt::Debug for DisposalRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DisposalRing")
            .field("generations", &state.generations.len())
            .field("newest", &state.newest)
            .field("custom_disposer", &self.disposer.is_some())
            .field(
                "pending",
                &state.generations.iter().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}
