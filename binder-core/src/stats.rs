//! Pass and lifetime counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for a single reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Bindings reconciled (including ones that retired or failed).
    pub visited: usize,

    /// Update callbacks that fired.
    pub updated: usize,

    /// Bindings unregistered by their removal predicate or by the failure policy.
    pub removed: usize,

    /// Bindings whose callbacks panicked.
    pub failed: usize,
}

/// Cumulative counters over the lifetime of a binder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BinderStats {
    pub passes: u64,
    pub updates: u64,
    pub removals: u64,
    pub failures: u64,
}

/// Lock-free accumulator behind [`BinderStats`].
#[derive(Debug, Default)]
pub(crate) struct StatsCounter {
    passes: AtomicU64,
    updates: AtomicU64,
    removals: AtomicU64,
    failures: AtomicU64,
}

impl StatsCounter {
    pub(crate) fn record(&self, pass: &PassStats) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.updates.fetch_add(pass.updated as u64, Ordering::Relaxed);
        self.removals.fetch_add(pass.removed as u64, Ordering::Relaxed);
        self.failures.fetch_add(pass.failed as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BinderStats {
        BinderStats {
            passes: self.passes.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_accumulates_passes() {
        let counter = StatsCounter::default();
        counter.record(&PassStats { visited: 3, updated: 2, removed: 1, failed: 0 });
        counter.record(&PassStats { visited: 2, updated: 0, removed: 0, failed: 1 });

        assert_eq!(
            counter.snapshot(),
            BinderStats { passes: 2, updates: 2, removals: 1, failures: 1 }
        );
    }

    #[test]
    fn stats_serialize() {
        let json = serde_json::to_string(&PassStats { visited: 1, ..Default::default() }).unwrap();
        assert_eq!(json, r#"{"visited":1,"updated":0,"removed":0,"failed":0}"#);
    }
}
