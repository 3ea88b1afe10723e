//! Worker metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single pool worker
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// Jobs that reached Completed
    completed_count: AtomicU64,
    /// Jobs that reached Failed
    failed_count: AtomicU64,
    /// Durable-store persist failures (job still completes)
    persist_failure_count: AtomicU64,
    /// Temp-resource cleanup failures
    cleanup_failure_count: AtomicU64,
}

impl WorkerMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get completed job count
    pub fn completed_count(&self) -> u64 {
        self.completed_count.load(Ordering::Relaxed)
    }

    /// Increment completed job count
    pub fn inc_completed_count(&self) {
        self.completed_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failed job count
    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    /// Increment failed job count
    pub fn inc_failed_count(&self) {
        self.failed_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get persist failure count
    pub fn persist_failure_count(&self) -> u64 {
        self.persist_failure_count.load(Ordering::Relaxed)
    }

    /// Increment persist failure count
    pub fn inc_persist_failure_count(&self) {
        self.persist_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cleanup failure count
    pub fn cleanup_failure_count(&self) -> u64 {
        self.cleanup_failure_count.load(Ordering::Relaxed)
    }

    /// Increment cleanup failure count
    pub fn inc_cleanup_failure_count(&self) {
        self.cleanup_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> WorkerMetricsSnapshot {
        WorkerMetricsSnapshot {
            completed_count: self.completed_count(),
            failed_count: self.failed_count(),
            persist_failure_count: self.persist_failure_count(),
            cleanup_failure_count: self.cleanup_failure_count(),
        }
    }
}

/// Snapshot of worker metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct WorkerMetricsSnapshot {
    pub completed_count: u64,
    pub failed_count: u64,
    pub persist_failure_count: u64,
    pub cleanup_failure_count: u64,
}
