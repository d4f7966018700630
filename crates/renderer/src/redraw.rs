//! Dirty-flag coalescing between mutation sources and the frame loop.
//!
//! Any number of notifications before a tick collapse into one redraw. A
//! notification that lands after `take_dirty` has swapped the flag is seen by
//! the next take, so no event is lost between two ticks.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirtyReason {
    ScriptChanged,
    ScriptDeleted,
    SceneReset,
    ClearColor,
    AssetChanged,
    Requested,
    RetryFailedFrame,
}

impl fmt::Display for DirtyReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ScriptChanged => "script changed",
            Self::ScriptDeleted => "script deleted",
            Self::SceneReset => "scene reset",
            Self::ClearColor => "clear colour changed",
            Self::AssetChanged => "asset changed",
            Self::Requested => "redraw requested",
            Self::RetryFailedFrame => "retrying failed frame",
        };
        formatter.write_str(name)
    }
}

/// Clonable, thread-safe notifier for a [`RedrawCoordinator`].
#[derive(Debug, Clone)]
pub struct RedrawHandle {
    dirty: Arc<AtomicBool>,
    pending: Arc<AtomicU64>,
}

impl RedrawHandle {
    #[inline]
    pub fn mark_dirty(&self, reason: DirtyReason) {
        // Count first so a take that observes the flag also observes the event.
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.dirty.store(true, Ordering::Release);
        trace!(target: "renderer", "marked dirty: {reason}");
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
pub struct RedrawCoordinator {
    dirty: Arc<AtomicBool>,
    pending: Arc<AtomicU64>,
}

impl RedrawCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> RedrawHandle {
        RedrawHandle {
            dirty: Arc::clone(&self.dirty),
            pending: Arc::clone(&self.pending),
        }
    }

    #[inline]
    pub fn mark_dirty(&self, reason: DirtyReason) {
        self.handle().mark_dirty(reason);
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clears the flag. Returns the number of events coalesced since the
    /// previous take, or `None` if the flag was clear.
    pub fn take_dirty(&self) -> Option<u64> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return None;
        }
        Some(self.pending.swap(0, Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn many_events_coalesce_into_one_take() {
        let coordinator = RedrawCoordinator::new();
        for _ in 0..5 {
            coordinator.mark_dirty(DirtyReason::ScriptChanged);
        }
        assert_eq!(coordinator.take_dirty(), Some(5));
        assert_eq!(coordinator.take_dirty(), None);
    }

    #[test]
    fn event_after_take_is_kept_for_next_tick() {
        let coordinator = RedrawCoordinator::new();
        coordinator.mark_dirty(DirtyReason::AssetChanged);
        assert!(coordinator.take_dirty().is_some());
        coordinator.mark_dirty(DirtyReason::ScriptDeleted);
        assert!(coordinator.is_dirty());
        assert_eq!(coordinator.take_dirty(), Some(1));
    }

    #[test]
    fn handles_from_other_threads_mark_dirty() {
        let coordinator = RedrawCoordinator::new();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = coordinator.handle();
                thread::spawn(move || {
                    for _ in 0..25 {
                        handle.mark_dirty(DirtyReason::Requested);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(coordinator.take_dirty(), Some(100));
    }
}
