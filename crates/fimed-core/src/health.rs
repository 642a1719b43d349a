//! Health reporting types for dependency monitoring.
//!
//! This module provides the types produced by health probes: the per-component
//! [`ComponentHealth`] record and the aggregate [`HealthReport`] returned to
//! callers. Reports are created fresh for every check and are never mutated
//! after construction.

use std::collections::BTreeMap;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};

/// Maximum length of a component health message in characters.
///
/// Messages coming out of failing dependencies can embed arbitrarily long
/// driver errors; anything beyond this bound is truncated on construction.
pub const MAX_MESSAGE_LEN: usize = 512;

/// Operational status of a single component or of a whole report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComponentStatus {
    /// The component answered its probe.
    #[default]
    Healthy,
    /// The component failed, errored, or timed out.
    Unhealthy,
}

impl ComponentStatus {
    /// Returns `true` for [`ComponentStatus::Healthy`].
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Converts a probe's boolean verdict into a status.
    #[must_use]
    pub const fn from_healthy(healthy: bool) -> Self {
        if healthy { Self::Healthy } else { Self::Unhealthy }
    }
}

/// Result of probing a single dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component identifier, e.g. `database` or `workers`.
    pub name: String,
    /// Verdict for this component.
    pub status: ComponentStatus,
    /// Human-readable detail, truncated to [`MAX_MESSAGE_LEN`].
    pub message: String,
    /// How long the probe took to answer.
    pub latency: Duration,
    /// When the probe was performed.
    pub checked_at: Timestamp,
}

impl ComponentHealth {
    /// Creates a new component result with the given verdict.
    pub fn new(
        name: impl Into<String>,
        status: ComponentStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            message: truncate_message(message.into()),
            latency: Duration::ZERO,
            checked_at: Timestamp::now(),
        }
    }

    /// Creates a healthy component result.
    pub fn healthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ComponentStatus::Healthy, message)
    }

    /// Creates an unhealthy component result.
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ComponentStatus::Unhealthy, message)
    }

    /// Sets the probe latency for this result.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns `true` if this component answered its probe.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}

/// Aggregate of all component results for one health check invocation.
///
/// The overall status is the logical AND of all component statuses; a report
/// with no components is healthy (vacuously true). Component order follows
/// probe registration order so reports are reproducible for identical probe
/// sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall verdict across all components.
    pub status: ComponentStatus,
    /// When the report was assembled.
    pub timestamp: Timestamp,
    /// Per-component results in registration order.
    pub components: Vec<ComponentHealth>,
    /// Snapshot of the process metrics registry, if one was attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, f64>>,
}

impl HealthReport {
    /// Assembles a report from component results, computing the overall status.
    pub fn new(components: Vec<ComponentHealth>) -> Self {
        let all_healthy = components.iter().all(ComponentHealth::is_healthy);

        Self {
            status: ComponentStatus::from_healthy(all_healthy),
            timestamp: Timestamp::now(),
            components,
            metrics: None,
        }
    }

    /// Attaches a metrics snapshot to the report.
    #[must_use]
    pub fn with_metrics(mut self, metrics: BTreeMap<String, f64>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns `true` if every component is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Looks up a component result by name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ComponentHealth> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Truncates a message to [`MAX_MESSAGE_LEN`] characters on a char boundary.
fn truncate_message(message: String) -> String {
    match message.char_indices().nth(MAX_MESSAGE_LEN) {
        Some((index, _)) => {
            let mut truncated = message;
            truncated.truncate(index);
            truncated
        }
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_status_conversions() {
        assert!(ComponentStatus::Healthy.is_healthy());
        assert!(!ComponentStatus::Unhealthy.is_healthy());
        assert_eq!(ComponentStatus::from_healthy(true), ComponentStatus::Healthy);
        assert_eq!(
            ComponentStatus::from_healthy(false),
            ComponentStatus::Unhealthy
        );
        assert_eq!(ComponentStatus::Unhealthy.as_ref(), "unhealthy");
    }

    #[test]
    fn message_is_truncated() {
        let long = "x".repeat(MAX_MESSAGE_LEN * 2);
        let component = ComponentHealth::unhealthy("database", long);
        assert_eq!(component.message.chars().count(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn message_truncation_respects_char_boundaries() {
        let long = "é".repeat(MAX_MESSAGE_LEN + 10);
        let component = ComponentHealth::unhealthy("database", long);
        assert_eq!(component.message.chars().count(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn empty_report_is_healthy() {
        let report = HealthReport::new(Vec::new());
        assert!(report.is_healthy());
        assert!(report.components.is_empty());
    }

    #[test]
    fn report_is_unhealthy_if_any_component_is() {
        let report = HealthReport::new(vec![
            ComponentHealth::healthy("database", "connected"),
            ComponentHealth::unhealthy("workers", "no workers"),
        ]);

        assert!(!report.is_healthy());
        assert_eq!(report.status, ComponentStatus::Unhealthy);

        let workers = report.component("workers").unwrap();
        assert_eq!(workers.message, "no workers");
        assert!(report.component("cache").is_none());
    }

    #[test]
    fn report_serializes_status_vocabulary() {
        let report = HealthReport::new(vec![ComponentHealth::healthy("cache", "ok")]);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["status"], "healthy");
        assert_eq!(value["components"][0]["status"], "healthy");
        assert!(value.get("metrics").is_none());
    }

    #[test]
    fn report_carries_metrics_snapshot() {
        let mut metrics = BTreeMap::new();
        metrics.insert("requests_total".to_string(), 42.0);

        let report = HealthReport::new(Vec::new()).with_metrics(metrics);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["metrics"]["requests_total"], 42.0);
    }
}
