//! Built-in probes for dependencies this workspace owns.
//!
//! Probes for external collaborators (relational store, task-queue workers)
//! are supplied by the embedding application as closures; the cache store is
//! ours, so its probe ships here.

use std::sync::Arc;

use async_trait::async_trait;
use fimed_cache::CacheStore;

use crate::service::health::{Probe, ProbeOutcome};

/// Key read to verify the cache store answers.
const SENTINEL_KEY: &str = "health_check_test";

/// Probe that pings a [`CacheStore`] by reading a sentinel key.
///
/// The key does not need to exist; any answer, hit or miss, proves the store
/// is reachable.
pub struct CacheStoreProbe {
    store: Arc<dyn CacheStore>,
}

impl CacheStoreProbe {
    /// Creates a probe against the given store.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Probe for CacheStoreProbe {
    async fn check(&self) -> ProbeOutcome {
        match self.store.get(SENTINEL_KEY).await {
            Ok(_) => ProbeOutcome::healthy("connected"),
            Err(error) => ProbeOutcome::unhealthy(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use fimed_cache::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn reachable_store_is_healthy() {
        let probe = CacheStoreProbe::new(Arc::new(MemoryStore::new()));
        let outcome = probe.check().await;

        assert!(outcome.healthy);
        assert_eq!(outcome.message, "connected");
    }

    #[tokio::test]
    async fn unreachable_store_reports_its_error() {
        use std::time::Duration;

        use fimed_cache::{Error, Result};
        use serde_json::Value;

        struct DownStore;

        #[async_trait]
        impl CacheStore for DownStore {
            async fn get(&self, _key: &str) -> Result<Option<Value>> {
                Err(Error::unavailable(std::io::Error::other("refused")))
            }
            async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> Result<()> {
                Ok(())
            }
            async fn delete(&self, _key: &str) -> Result<()> {
                Ok(())
            }
        }

        let probe = CacheStoreProbe::new(Arc::new(DownStore));
        let outcome = probe.check().await;

        assert!(!outcome.healthy);
        assert!(outcome.message.contains("unavailable"));
    }
}
