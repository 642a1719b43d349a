//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod monitors;
mod response;

use axum::Router;

pub use crate::handler::response::{ComponentResponse, HealthReportResponse, LivenessResponse};
use crate::service::ServiceState;

/// Returns a [`Router`] with all monitoring routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> Router<ServiceState> {
    Router::new().merge(monitors::routes())
}

#[cfg(test)]
pub(crate) mod test {
    use axum_test::TestServer;

    use crate::handler;
    use crate::service::{ServiceConfig, ServiceState};

    /// Returns a new [`TestServer`] with the default configuration, plus the
    /// state so tests can register probes and record metrics.
    pub async fn create_test_server() -> anyhow::Result<(TestServer, ServiceState)> {
        let config = ServiceConfig::builder()
            .with_probe_timeout_secs(1u64)
            .build()?;
        create_test_server_with_config(&config).await
    }

    /// Returns a new [`TestServer`] over the given configuration.
    pub async fn create_test_server_with_config(
        config: &ServiceConfig,
    ) -> anyhow::Result<(TestServer, ServiceState)> {
        let state = ServiceState::from_config(config)?;
        let app = handler::routes().with_state(state.clone());
        let server = TestServer::new(app)?;
        Ok((server, state))
    }

    #[tokio::test]
    async fn handlers() -> anyhow::Result<()> {
        let (server, _state) = create_test_server().await?;
        assert!(server.is_running());
        Ok(())
    }
}
