// Teardown-order tracking
//
// Each later-created handle is only valid while all of its dependencies are
// live, so destruction must run in strict reverse creation order. Parents
// count their live dependents; a guard held by each child keeps the count
// honest even when the child is dropped instead of destroyed explicitly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Live-dependent counter owned by a parent object.
pub(crate) struct ChildTracker(Arc<AtomicUsize>);

impl ChildTracker {
    pub fn new() -> Self {
        Self(Arc::new(AtomicUsize::new(0)))
    }

    /// Number of dependents currently alive.
    pub fn live(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    /// Register a new dependent; the returned guard unregisters on drop.
    pub fn register(&self) -> ChildGuard {
        self.0.fetch_add(1, Ordering::AcqRel);
        ChildGuard(self.0.clone())
    }
}

/// RAII registration of one child with its parent's tracker.
pub(crate) struct ChildGuard(Arc<AtomicUsize>);

impl ChildGuard {
    /// Keep the parent's count elevated forever.
    ///
    /// Used when a child leaks its native handle: the parent must keep
    /// refusing orderly teardown rather than free a handle the leaked child
    /// still references.
    pub fn leak(self) {
        std::mem::forget(self);
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let tracker = ChildTracker::new();
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn register_and_release() {
        let tracker = ChildTracker::new();
        let a = tracker.register();
        let b = tracker.register();
        assert_eq!(tracker.live(), 2);
        drop(a);
        assert_eq!(tracker.live(), 1);
        drop(b);
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn leaked_guard_pins_the_count() {
        let tracker = ChildTracker::new();
        tracker.register().leak();
        assert_eq!(tracker.live(), 1);
    }
}
