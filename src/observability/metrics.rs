//! Metrics registry for aerochat
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters
///
/// All counters use Relaxed atomics; they are read for reporting only and
/// never drive ordering decisions.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Successful joins
    sessions_joined: AtomicU64,
    /// Leaves that emitted a `Left` event
    sessions_left: AtomicU64,
    /// Chat messages accepted
    messages_accepted: AtomicU64,
    /// Events stamped by the clock
    events_stamped: AtomicU64,
    /// Pushes into live sinks
    deliveries: AtomicU64,
    /// Pushes skipped because the sink was closed
    deliveries_dropped: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_sessions_joined(&self) {
        self.sessions_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sessions_left(&self) {
        self.sessions_left.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_messages_accepted(&self) {
        self.messages_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_events_stamped(&self) {
        self.events_stamped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_deliveries(&self, count: u64) {
        self.deliveries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_deliveries_dropped(&self, count: u64) {
        self.deliveries_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Sessions currently joined
    pub fn active_sessions(&self) -> u64 {
        let joined = self.sessions_joined.load(Ordering::Relaxed);
        let left = self.sessions_left.load(Ordering::Relaxed);
        joined.saturating_sub(left)
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_joined: self.sessions_joined.load(Ordering::Relaxed),
            sessions_left: self.sessions_left.load(Ordering::Relaxed),
            messages_accepted: self.messages_accepted.load(Ordering::Relaxed),
            events_stamped: self.events_stamped.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            deliveries_dropped: self.deliveries_dropped.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub sessions_joined: u64,
    pub sessions_left: u64,
    pub messages_accepted: u64,
    pub events_stamped: u64,
    pub deliveries: u64,
    pub deliveries_dropped: u64,
}
