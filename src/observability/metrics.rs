//! Execution counters
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by every execution of one executor
///
/// Relaxed ordering; readers only ever see snapshots.
#[derive(Debug, Default)]
pub struct ExecMetrics {
    /// Set executions started
    sets_executed: AtomicU64,
    /// Set executions that ended in an error result
    sets_failed: AtomicU64,
    /// Queries that completed
    queries_executed: AtomicU64,
    /// Queries that failed, skipped or not
    queries_failed: AtomicU64,
    /// Failed queries passed over because of `Continue`
    queries_skipped: AtomicU64,
}

impl ExecMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_sets_executed(&self) {
        self.sets_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sets_failed(&self) {
        self.sets_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_skipped(&self) {
        self.queries_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sets_executed: self.sets_executed.load(Ordering::Relaxed),
            sets_failed: self.sets_failed.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            queries_skipped: self.queries_skipped.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub sets_executed: u64,
    pub sets_failed: u64,
    pub queries_executed: u64,
    pub queries_failed: u64,
    pub queries_skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        assert_eq!(ExecMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increments() {
        let metrics = ExecMetrics::new();
        metrics.increment_sets_executed();
        metrics.increment_sets_executed();
        metrics.increment_queries_failed();
        metrics.increment_queries_skipped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sets_executed, 2);
        assert_eq!(snapshot.queries_failed, 1);
        assert_eq!(snapshot.queries_skipped, 1);
        assert_eq!(snapshot.sets_failed, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(ExecMetrics::new().snapshot()).unwrap();
        assert_eq!(json["queries_executed"], 0);
    }
}
