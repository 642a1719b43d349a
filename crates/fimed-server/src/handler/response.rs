//! Response types for the health monitoring endpoints.

use std::collections::BTreeMap;

use fimed_core::{ComponentStatus, HealthReport};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::service::LIVENESS_STATUS;

/// Wire form of a single component's verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentResponse {
    /// Component verdict, `healthy` or `unhealthy`.
    pub status: ComponentStatus,
    /// Human-readable detail.
    pub message: String,
}

/// Wire form of a full health report.
///
/// Components are keyed by name in a sorted map, so the serialized document
/// is deterministic for identical probe sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReportResponse {
    /// Overall verdict, `healthy` or `unhealthy`.
    pub status: ComponentStatus,
    /// When the report was assembled, ISO-8601.
    pub timestamp: Timestamp,
    /// Per-component verdicts keyed by component name.
    pub components: BTreeMap<String, ComponentResponse>,
    /// Snapshot of the process metrics registry, if one was attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, f64>>,
}

impl From<HealthReport> for HealthReportResponse {
    fn from(report: HealthReport) -> Self {
        let components = report
            .components
            .into_iter()
            .map(|component| {
                (
                    component.name,
                    ComponentResponse {
                        status: component.status,
                        message: component.message,
                    },
                )
            })
            .collect();

        Self {
            status: report.status,
            timestamp: report.timestamp,
            components,
            metrics: report.metrics,
        }
    }
}

/// Wire form of the liveness signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive` while the process can answer requests.
    pub status: String,
}

impl LivenessResponse {
    /// Creates the static liveness signal.
    #[must_use]
    pub fn alive() -> Self {
        Self {
            status: LIVENESS_STATUS.to_string(),
        }
    }
}
