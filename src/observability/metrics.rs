//! Nibble metrics
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Relaxed atomics; exactness per counter, not across counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters of a `NibbleEngine`
#[derive(Debug, Default)]
pub struct NibbleMetrics {
    /// Export/delete-with-chunking invocations that completed
    export_invocations: AtomicU64,
    /// Delete-only invocations that completed
    delete_invocations: AtomicU64,
    /// Invocations aborted with an error
    aborts: AtomicU64,
    /// Rows copied into sink tables
    rows_exported: AtomicU64,
    /// Rows removed from source tables
    rows_deleted: AtomicU64,
    /// VALUE-AT lookups that produced a tighter bound
    cutoff_lookups: AtomicU64,
    /// Invocations that ran without a supporting index
    unindexed_runs: AtomicU64,
    /// Statement sets served from cache
    statement_cache_hits: AtomicU64,
    /// Statement sets resolved from the catalog
    statement_cache_misses: AtomicU64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub export_invocations: u64,
    pub delete_invocations: u64,
    pub aborts: u64,
    pub rows_exported: u64,
    pub rows_deleted: u64,
    pub cutoff_lookups: u64,
    pub unindexed_runs: u64,
    pub statement_cache_hits: u64,
    pub statement_cache_misses: u64,
}

impl NibbleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_export_invocations(&self) {
        self.export_invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_delete_invocations(&self) {
        self.delete_invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_aborts(&self) {
        self.aborts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rows_exported(&self, rows: u64) {
        self.rows_exported.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn add_rows_deleted(&self, rows: u64) {
        self.rows_deleted.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn increment_cutoff_lookups(&self) {
        self.cutoff_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unindexed_runs(&self) {
        self.unindexed_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_statement_cache_hits(&self) {
        self.statement_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_statement_cache_misses(&self) {
        self.statement_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            export_invocations: self.export_invocations.load(Ordering::Relaxed),
            delete_invocations: self.delete_invocations.load(Ordering::Relaxed),
            aborts: self.aborts.load(Ordering::Relaxed),
            rows_exported: self.rows_exported.load(Ordering::Relaxed),
            rows_deleted: self.rows_deleted.load(Ordering::Relaxed),
            cutoff_lookups: self.cutoff_lookups.load(Ordering::Relaxed),
            unindexed_runs: self.unindexed_runs.load(Ordering::Relaxed),
            statement_cache_hits: self.statement_cache_hits.load(Ordering::Relaxed),
            statement_cache_misses: self.statement_cache_misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(NibbleMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = NibbleMetrics::new();
        metrics.increment_export_invocations();
        metrics.increment_export_invocations();
        metrics.add_rows_exported(100);
        metrics.add_rows_deleted(100);
        metrics.add_rows_deleted(5);
        metrics.increment_statement_cache_misses();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.export_invocations, 2);
        assert_eq!(snapshot.rows_exported, 100);
        assert_eq!(snapshot.rows_deleted, 105);
        assert_eq!(snapshot.statement_cache_misses, 1);
        assert_eq!(snapshot.statement_cache_hits, 0);
    }

    #[test]
    fn test_concurrent_increments() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(NibbleMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..250 {
                        m.increment_aborts();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(metrics.snapshot().aborts, 1000);
    }
}
