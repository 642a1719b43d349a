//! Process-wide metrics registry.
//!
//! A lightweight name-to-number registry that request handlers and services
//! update as they work, and that the health aggregator samples into its
//! reports. Clones share the same underlying map, so one registry can be
//! handed to every component that records metrics.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Named numeric metrics with a sorted snapshot view.
///
/// All operations take `&self`; the registry is safe to update from multiple
/// threads concurrently. Snapshots are point-in-time copies and never observe
/// partial updates of a single metric.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<RwLock<BTreeMap<String, f64>>>,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments a counter by one, creating it at zero if absent.
    pub fn increment(&self, name: &str) {
        self.add(name, 1.0);
    }

    /// Adds a delta to a metric, creating it at zero if absent.
    pub fn add(&self, name: &str, delta: f64) {
        let mut metrics = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *metrics.entry(name.to_string()).or_insert(0.0) += delta;
    }

    /// Sets a gauge to an absolute value.
    pub fn set(&self, name: &str, value: f64) {
        let mut metrics = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        metrics.insert(name.to_string(), value);
    }

    /// Returns the current value of a metric, if recorded.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        let metrics = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        metrics.get(name).copied()
    }

    /// Returns a point-in-time copy of all metrics, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        let metrics = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        metrics.clone()
    }
}
