//! Query metrics registry
//!
//! - Counters only, monotonic
//! - Reset only when the registry is created
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one facade
///
/// All counters use Relaxed atomics; values are exact once callers quiesce.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Fan-outs planned
    queries_planned: AtomicU64,
    /// Queries rejected before dispatch
    queries_rejected: AtomicU64,
    /// Per-collection queries issued
    collections_dispatched: AtomicU64,
    /// Documents handed to callers
    documents_returned: AtomicU64,
    /// Fan-outs that skipped collections on an exhausted budget
    fanouts_short_circuited: AtomicU64,
    /// Per-collection queries that failed
    dispatch_failures: AtomicU64,
    /// Upserts applied
    upserts: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment fan-outs planned
    pub fn increment_queries_planned(&self) {
        self.queries_planned.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment queries rejected
    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment per-collection dispatches
    pub fn increment_collections_dispatched(&self) {
        self.collections_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Add to documents returned
    pub fn add_documents_returned(&self, count: u64) {
        self.documents_returned.fetch_add(count, Ordering::Relaxed);
    }

    /// Increment short-circuited fan-outs
    pub fn increment_short_circuits(&self) {
        self.fanouts_short_circuited.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment dispatch failures
    pub fn increment_dispatch_failures(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment upserts
    pub fn increment_upserts(&self) {
        self.upserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_planned: self.queries_planned.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            collections_dispatched: self.collections_dispatched.load(Ordering::Relaxed),
            documents_returned: self.documents_returned.load(Ordering::Relaxed),
            fanouts_short_circuited: self.fanouts_short_circuited.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            upserts: self.upserts.load(Ordering::Relaxed),
        }
    }

    /// Current snapshot as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or_default()
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub queries_planned: u64,
    pub queries_rejected: u64,
    pub collections_dispatched: u64,
    pub documents_returned: u64,
    pub fanouts_short_circuited: u64,
    pub dispatch_failures: u64,
    pub upserts: u64,
}
