//! Evaluator identities.
//!
//! Every freshly constructed or mutated evaluator draws a new identifier from
//! an [`IdAllocator`]. Identifiers are unique within an allocator and
//! strictly increasing in allocation order. [`IdAllocator::shared`] is the
//! process-wide allocator used when no explicit one is injected.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

/// Lineage identifier of an evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvaluatorId(pub u64);

impl EvaluatorId {
    /// Get the raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EvaluatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Atomic source of evaluator identities.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Create an allocator whose first id is 0.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create an allocator whose first id is `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// The process-wide allocator.
    pub fn shared() -> Arc<IdAllocator> {
        static SHARED: OnceLock<Arc<IdAllocator>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(IdAllocator::new())))
    }

    /// Hand out the next identity.
    pub fn allocate(&self) -> EvaluatorId {
        EvaluatorId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Make sure future allocations come after `id`.
    ///
    /// Called for identities restored from disk.
    pub fn observe(&self, id: EvaluatorId) {
        self.next.fetch_max(id.0.saturating_add(1), Ordering::Relaxed);
    }

    /// The id the next call to [`allocate`](Self::allocate) would return.
    #[must_use]
    pub fn peek(&self) -> EvaluatorId {
        EvaluatorId(self.next.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_monotonic() {
        let ids = IdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        let c = ids.allocate();

        assert_eq!(a, EvaluatorId(0));
        assert!(a < b && b < c);
        assert_eq!(ids.peek(), EvaluatorId(3));
    }

    #[test]
    fn test_observe_bumps_past_loaded_id() {
        let ids = IdAllocator::new();
        ids.observe(EvaluatorId(41));
        assert_eq!(ids.allocate(), EvaluatorId(42));

        // Observing an older id never moves the counter backwards
        ids.observe(EvaluatorId(3));
        assert_eq!(ids.allocate(), EvaluatorId(43));
    }

    #[test]
    fn test_concurrent_allocation_is_unique() {
        let ids = Arc::new(IdAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..1000).map(|_| ids.allocate()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<_> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 8000);
    }

    #[test]
    fn test_shared_is_single_instance() {
        let a = IdAllocator::shared();
        let b = IdAllocator::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", EvaluatorId(17)), "17");
    }
}
