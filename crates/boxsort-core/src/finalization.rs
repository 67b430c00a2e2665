//! At-most-once box finalization
//!
//! Counts finalized boxes and notifies listeners when the configured total
//! is reached.

use crate::types::BoxId;
use indexmap::IndexSet;
use std::fmt;

/// Callback invoked with the finalized count when the total is reached
pub type ThresholdListener = Box<dyn FnMut(usize)>;

/// Result of a finalize call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Box was already finalized; nothing changed
    AlreadyFinalized,
    /// Box is now finalized
    Finalized {
        /// Finalized boxes including this one
        count: usize,
        /// This call brought the count to the configured total
        threshold_reached: bool,
    },
}

impl FinalizeOutcome {
    #[inline]
    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, FinalizeOutcome::Finalized { .. })
    }

    #[inline]
    #[must_use]
    pub fn threshold_reached(self) -> bool {
        matches!(
            self,
            FinalizeOutcome::Finalized {
                threshold_reached: true,
                ..
            }
        )
    }
}

pub struct FinalizationTracker {
    total: usize,
    finalized: IndexSet<BoxId>,
    listeners: Vec<ThresholdListener>,
}

impl FinalizationTracker {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            finalized: IndexSet::new(),
            listeners: Vec::new(),
        }
    }

    /// Register a listener; listeners run in registration order
    pub fn subscribe(&mut self, listener: impl FnMut(usize) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn finalize(&mut self, id: BoxId) -> FinalizeOutcome {
        if !self.finalized.insert(id) {
            tracing::debug!(box_id = %id, "box already finalized");
            return FinalizeOutcome::AlreadyFinalized;
        }

        let count = self.finalized.len();
        let threshold_reached = count == self.total;
        if threshold_reached {
            tracing::info!(count, "all boxes finalized");
            for listener in &mut self.listeners {
                listener(count);
            }
        }
        FinalizeOutcome::Finalized {
            count,
            threshold_reached,
        }
    }

    #[must_use]
    pub fn is_finalized(&self, id: BoxId) -> bool {
        self.finalized.contains(&id)
    }

    #[must_use]
    pub fn finalized_count(&self) -> usize {
        self.finalized.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Finalized ids in finalization order
    pub fn finalized_ids(&self) -> impl Iterator<Item = BoxId> + '_ {
        self.finalized.iter().copied()
    }
}

impl fmt::Debug for FinalizationTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinalizationTracker")
            .field("total", &self.total)
            .field("finalized", &self.finalized)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn finalize_twice_is_finalize_once() {
        let mut tracker = FinalizationTracker::new(3);
        assert!(tracker.finalize(BoxId(1)).is_new());
        assert_eq!(
            tracker.finalize(BoxId(1)),
            FinalizeOutcome::AlreadyFinalized
        );
        assert_eq!(tracker.finalized_count(), 1);
        assert!(tracker.is_finalized(BoxId(1)));
        assert!(!tracker.is_finalized(BoxId(2)));
    }

    #[test]
    fn listeners_fire_once_in_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut tracker = FinalizationTracker::new(2);
        for name in ["first", "second"] {
            let calls = Rc::clone(&calls);
            tracker.subscribe(move |count| calls.borrow_mut().push((name, count)));
        }

        assert!(!tracker.finalize(BoxId(0)).threshold_reached());
        assert!(calls.borrow().is_empty());
        assert!(tracker.finalize(BoxId(1)).threshold_reached());
        tracker.finalize(BoxId(1));
        tracker.finalize(BoxId(0));

        assert_eq!(*calls.borrow(), vec![("first", 2), ("second", 2)]);
    }

    #[test]
    fn count_past_total_does_not_renotify() {
        let fired = Rc::new(RefCell::new(0));
        let mut tracker = FinalizationTracker::new(1);
        let counter = Rc::clone(&fired);
        tracker.subscribe(move |_| *counter.borrow_mut() += 1);

        tracker.finalize(BoxId(0));
        let outcome = tracker.finalize(BoxId(1));
        assert!(!outcome.threshold_reached());
        assert_eq!(*fired.borrow(), 1);
    }
}
