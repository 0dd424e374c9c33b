//! Dispatch metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, Relaxed ordering

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters owned by a method registry
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Layers declared
    declarations: AtomicU64,
    /// Declarations refused
    declarations_rejected: AtomicU64,
    /// `call` dispatches
    calls: AtomicU64,
    /// `call_super` dispatches that reached a layer
    super_calls: AtomicU64,
    /// `call_super` from the first layer, returning no value
    super_terminals: AtomicU64,
    /// Dispatches that returned an error
    failures: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_declarations(&self) {
        self.declarations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_declarations_rejected(&self) {
        self.declarations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_calls(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_super_calls(&self) {
        self.super_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_super_terminals(&self) {
        self.super_terminals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters at once
    pub fn snapshot(&self) -> DispatchMetricsSnapshot {
        DispatchMetricsSnapshot {
            declarations: self.declarations.load(Ordering::Relaxed),
            declarations_rejected: self.declarations_rejected.load(Ordering::Relaxed),
            calls: self.calls.load(Ordering::Relaxed),
            super_calls: self.super_calls.load(Ordering::Relaxed),
            super_terminals: self.super_terminals.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`DispatchMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchMetricsSnapshot {
    pub declarations: u64,
    pub declarations_rejected: u64,
    pub calls: u64,
    pub super_calls: u64,
    pub super_terminals: u64,
    pub failures: u64,
}

impl DispatchMetricsSnapshot {
    /// Serialize as a single JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
