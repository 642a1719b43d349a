//! Application state and dependency injection.

mod config;
mod error;
mod health;
mod probes;

use std::sync::Arc;

use fimed_cache::{CacheStore, MemoryStore, ResponseCache};
use fimed_core::MetricsRegistry;

pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::service::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::service::health::{
    FnProbe, HealthAggregator, LIVENESS_STATUS, Probe, ProbeOutcome, ProbeScope,
};
pub use crate::service::probes::CacheStoreProbe;

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // External services:
    pub cache: ResponseCache,

    // Internal services:
    pub health: HealthAggregator,
    pub metrics: MetricsRegistry,
}

impl ServiceState {
    /// Initializes application state with an in-memory cache store.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::from_config_with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Initializes application state over an externally supplied cache store.
    ///
    /// Registers the cache store probe; probes for the application's other
    /// dependencies are registered by the caller on the returned state's
    /// aggregator.
    pub fn from_config_with_store(
        config: &ServiceConfig,
        store: Arc<dyn CacheStore>,
    ) -> Result<Self> {
        config.validate()?;

        let metrics = MetricsRegistry::new();
        let health = config
            .create_health_aggregator()
            .with_metrics(metrics.clone());
        health.register(
            "cache",
            ProbeScope::Both,
            CacheStoreProbe::new(Arc::clone(&store)),
        );

        Ok(Self {
            cache: config.create_response_cache(store),
            health,
            metrics,
        })
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(cache: ResponseCache);

// Internal services:
impl_di!(health: HealthAggregator);
impl_di!(metrics: MetricsRegistry);
