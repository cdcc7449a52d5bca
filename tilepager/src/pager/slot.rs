//! Per-tile bookkeeping held in the usage tracker.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cache::FetchError;
use crate::scheduler::PriorityFn;

/// Lifecycle state of a tracked tile, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileState {
    /// Fetch or build has not finished yet.
    Pending,
    /// The resource is built and ready to draw.
    Resident,
    /// The fetch failed; the failure is memoized.
    Failed(FetchError),
}

/// Latest priority for a tile, readable from queued tasks.
///
/// Stored as `f32` bits so the selector can update it every cycle without a
/// lock.
#[derive(Debug, Clone)]
pub(crate) struct PriorityCell(Arc<AtomicU32>);

impl PriorityCell {
    pub(crate) fn new(priority: f32) -> Self {
        Self(Arc::new(AtomicU32::new(priority.to_bits())))
    }

    pub(crate) fn set(&self, priority: f32) {
        self.0.store(priority.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Priority function that follows this cell.
    pub(crate) fn supplier(&self) -> PriorityFn {
        let cell = self.clone();
        Box::new(move || cell.get())
    }
}

pub(crate) enum SlotState<R> {
    Pending,
    Resident(R),
    Failed(FetchError),
}

/// A tracked tile.
pub(crate) struct TileSlot<R> {
    pub(crate) state: SlotState<R>,
    pub(crate) priority: PriorityCell,
    /// Canceled on eviction; queued load and build tasks check it at pop.
    pub(crate) cancel: CancellationToken,
    pub(crate) created_cycle: u64,
}

impl<R> TileSlot<R> {
    pub(crate) fn new(priority: f32, cycle: u64) -> Self {
        Self {
            state: SlotState::Pending,
            priority: PriorityCell::new(priority),
            cancel: CancellationToken::new(),
            created_cycle: cycle,
        }
    }

    pub(crate) fn view(&self) -> TileState {
        match &self.state {
            SlotState::Pending => TileState::Pending,
            SlotState::Resident(_) => TileState::Resident,
            SlotState::Failed(error) => TileState::Failed(error.clone()),
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        matches!(self.state, SlotState::Pending)
    }

    pub(crate) fn resource(&self) -> Option<&R> {
        match &self.state {
            SlotState::Resident(resource) => Some(resource),
            _ => None,
        }
    }

    /// Cancels queued work and hands back the resource, if built.
    pub(crate) fn retire(self) -> Option<R> {
        self.cancel.cancel();
        match self.state {
            SlotState::Resident(resource) => Some(resource),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_cell_is_shared() {
        let cell = PriorityCell::new(1.5);
        let supplier = cell.supplier();
        assert_eq!(supplier(), 1.5);

        cell.set(-4.0);
        assert_eq!(supplier(), -4.0);
    }

    #[test]
    fn test_retire_cancels_and_returns_resource() {
        let mut slot: TileSlot<&str> = TileSlot::new(0.0, 3);
        let token = slot.cancel.clone();
        slot.state = SlotState::Resident("mesh");

        assert_eq!(slot.view(), TileState::Resident);
        assert_eq!(slot.retire(), Some("mesh"));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_retire_pending_slot_returns_nothing() {
        let slot: TileSlot<&str> = TileSlot::new(0.0, 0);
        assert!(slot.is_pending());
        assert_eq!(slot.retire(), None);
    }
}
