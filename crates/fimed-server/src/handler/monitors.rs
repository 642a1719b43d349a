//! System health monitoring and status check handlers.
//!
//! Exposes the composite health report on `/health`, a static liveness
//! signal on `/health/live`, and the readiness-filtered report on
//! `/health/ready`. Health endpoints always answer with a well-formed
//! report; an unhealthy system is a 503, never a bare 500.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::handler::response::{HealthReportResponse, LivenessResponse};
use crate::service::{HealthAggregator, ServiceState};

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "fimed_server::handler::monitors";

/// Maps a report's overall status onto the HTTP status code.
fn report_status_code(response: &HealthReportResponse) -> StatusCode {
    if response.status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn health_status(
    State(health): State<HealthAggregator>,
) -> (StatusCode, Json<HealthReportResponse>) {
    let report = health.run_all().await;
    let response = HealthReportResponse::from(report);
    let status_code = report_status_code(&response);

    tracing::info!(
        target: TRACING_TARGET,
        overall_healthy = response.status.is_healthy(),
        components = response.components.len(),
        status_code = status_code.as_u16(),
        "health status response prepared"
    );

    (status_code, Json(response))
}

async fn liveness_status() -> Json<LivenessResponse> {
    Json(LivenessResponse::alive())
}

async fn readiness_status(
    State(health): State<HealthAggregator>,
) -> (StatusCode, Json<HealthReportResponse>) {
    let report = health.readiness().await;
    let response = HealthReportResponse::from(report);
    let status_code = report_status_code(&response);

    tracing::info!(
        target: TRACING_TARGET,
        overall_healthy = response.status.is_healthy(),
        components = response.components.len(),
        status_code = status_code.as_u16(),
        "readiness response prepared"
    );

    (status_code, Json(response))
}

/// Returns a [`Router`] with all health monitoring routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/health", get(health_status))
        .route("/health/live", get(liveness_status))
        .route("/health/ready", get(readiness_status))
}
