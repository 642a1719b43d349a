//! Service configuration.

use std::sync::Arc;
use std::time::Duration;

use derive_builder::Builder;
use fimed_cache::{CacheConfig, CacheStore, ResponseCache};
use serde::{Deserialize, Serialize};

use crate::service::error::{Error, Result};
use crate::service::health::HealthAggregator;

/// Default values for configuration options.
mod defaults {
    /// Default per-probe timeout in seconds.
    pub const PROBE_TIMEOUT_SECS: u64 = 5;

    /// Default cache TTL in seconds.
    pub const CACHE_TTL_SECS: u64 = 300;

    /// Default cache key prefix.
    pub fn cache_key_prefix() -> String {
        "fimed".to_string()
    }

    /// Degrade to direct computation when the cache store is unreachable.
    pub const CACHE_FALLBACK_TO_PRODUCER: bool = true;
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// Timeout for a single health probe in seconds.
    #[builder(default = "defaults::PROBE_TIMEOUT_SECS")]
    pub probe_timeout_secs: u64,

    /// TTL for cached responses in seconds.
    #[builder(default = "defaults::CACHE_TTL_SECS")]
    pub cache_ttl_secs: u64,

    /// Prefix prepended to every derived cache key.
    #[builder(default = "defaults::cache_key_prefix()")]
    pub cache_key_prefix: String,

    /// Degrade to direct computation when the cache store is unreachable.
    #[builder(default = "defaults::CACHE_FALLBACK_TO_PRODUCER")]
    pub cache_fallback_to_producer: bool,
}

impl ServiceConfig {
    /// Returns a builder for this configuration.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Checks the configuration for unusable values.
    pub fn validate(&self) -> Result<()> {
        if self.probe_timeout_secs == 0 {
            return Err(Error::config("probe timeout must be greater than zero"));
        }
        if self.cache_ttl_secs == 0 {
            return Err(Error::config("cache TTL must be greater than zero"));
        }
        if self.cache_key_prefix.is_empty() {
            return Err(Error::config("cache key prefix must not be empty"));
        }
        Ok(())
    }

    /// Returns the per-probe timeout as a [`Duration`].
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Returns the cache layer configuration derived from this config.
    #[must_use]
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            default_ttl: Duration::from_secs(self.cache_ttl_secs),
            key_prefix: self.cache_key_prefix.clone(),
            fallback_to_producer: self.cache_fallback_to_producer,
        }
    }

    /// Creates the response cache over the given store.
    pub fn create_response_cache(&self, store: Arc<dyn CacheStore>) -> ResponseCache {
        ResponseCache::with_config(store, self.cache_config())
    }

    /// Creates an empty health aggregator with the configured timeout.
    pub fn create_health_aggregator(&self) -> HealthAggregator {
        HealthAggregator::with_probe_timeout(self.probe_timeout())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: defaults::PROBE_TIMEOUT_SECS,
            cache_ttl_secs: defaults::CACHE_TTL_SECS,
            cache_key_prefix: defaults::cache_key_prefix(),
            cache_fallback_to_producer: defaults::CACHE_FALLBACK_TO_PRODUCER,
        }
    }
}

impl ServiceConfigBuilder {
    /// Rejects unusable values before the config is built.
    fn validate(&self) -> std::result::Result<(), String> {
        if self.probe_timeout_secs == Some(0) {
            return Err("probe timeout must be greater than zero".to_string());
        }
        if self.cache_ttl_secs == Some(0) {
            return Err("cache TTL must be greater than zero".to_string());
        }
        if matches!(&self.cache_key_prefix, Some(prefix) if prefix.is_empty()) {
            return Err("cache key prefix must not be empty".to_string());
        }
        Ok(())
    }
}
