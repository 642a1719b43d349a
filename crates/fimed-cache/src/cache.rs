//! Get-or-compute caching over a pluggable store.
//!
//! [`ResponseCache`] fronts a [`CacheStore`] with the policy knobs handlers
//! need: bypass, forced refresh, per-call TTL overrides, and degradation to
//! direct computation when the store is unreachable. Handlers call
//! [`ResponseCache::get_or_compute`] explicitly, passing their own computation
//! as the producer; there is no implicit function wrapping.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{BoxedError, Error, Result};
use crate::key::{RequestFingerprint, derive_key};
use crate::store::CacheStore;

/// Tracing target for cache front operations.
const TRACING_TARGET: &str = "fimed_cache::cache";

/// Default TTL applied when a call does not override it.
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default key prefix.
const DEFAULT_KEY_PREFIX: &str = "fimed";

/// Per-instance cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for entries stored without an explicit override.
    pub default_ttl: Duration,
    /// Prefix prepended to every derived key.
    pub key_prefix: String,
    /// Degrade to direct computation when the store is unreachable, instead
    /// of surfacing [`Error::Unavailable`] to the caller.
    pub fallback_to_producer: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            fallback_to_producer: true,
        }
    }
}

/// Per-call fetch policy for [`ResponseCache::get_or_compute`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Always invoke the producer and return its result uncached.
    pub skip_cache: bool,
    /// Invoke the producer even on a hit and overwrite the stored value.
    pub force_refresh: bool,
    /// TTL override for the stored result.
    pub ttl: Option<Duration>,
}

impl FetchOptions {
    /// Policy that bypasses the cache entirely.
    #[must_use]
    pub fn bypass() -> Self {
        Self {
            skip_cache: true,
            ..Self::default()
        }
    }

    /// Policy that recomputes and overwrites any stored value.
    #[must_use]
    pub fn refresh() -> Self {
        Self {
            force_refresh: true,
            ..Self::default()
        }
    }

    /// Sets a TTL override for the stored result.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Cache front over an externally supplied store.
///
/// Holds no entries itself, only configuration and the store handle; clones
/// share the store. Multiple independently configured caches may coexist.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl ResponseCache {
    /// Creates a cache front with the default configuration.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_config(store, CacheConfig::default())
    }

    /// Creates a cache front with custom configuration.
    pub fn with_config(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        tracing::debug!(
            target: TRACING_TARGET,
            default_ttl_secs = config.default_ttl.as_secs(),
            key_prefix = %config.key_prefix,
            fallback_to_producer = config.fallback_to_producer,
            "response cache initialized"
        );

        Self { store, config }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Derives the cache key for a request fingerprint using the configured
    /// prefix.
    #[must_use]
    pub fn derive_key(&self, fingerprint: &RequestFingerprint) -> String {
        derive_key(&self.config.key_prefix, fingerprint)
    }

    /// Returns the cached value under `key`, or computes, stores, and returns
    /// it.
    ///
    /// Producer failures propagate as [`Error::Producer`] and nothing is
    /// cached. Concurrent misses for the same key may each invoke the
    /// producer; calls are not coalesced.
    pub async fn get_or_compute<T, F, Fut, E>(
        &self,
        key: &str,
        options: FetchOptions,
        producer: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxedError>,
    {
        if options.skip_cache {
            tracing::debug!(target: TRACING_TARGET, key = key, "cache bypass requested");
            return produce(producer).await;
        }

        if !options.force_refresh {
            match self.store.get(key).await {
                Ok(Some(value)) => match serde_json::from_value(value) {
                    Ok(decoded) => {
                        tracing::debug!(target: TRACING_TARGET, key = key, "cache hit");
                        return Ok(decoded);
                    }
                    Err(error) => {
                        tracing::warn!(
                            target: TRACING_TARGET,
                            key = key,
                            error = %error,
                            "cached value failed to decode, recomputing"
                        );
                    }
                },
                Ok(None) => {
                    tracing::debug!(target: TRACING_TARGET, key = key, "cache miss");
                }
                Err(error) if self.config.fallback_to_producer => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        key = key,
                        error = %error,
                        "cache store unavailable, falling back to producer"
                    );
                    return produce(producer).await;
                }
                Err(error) => return Err(error),
            }
        }

        let produced = produce(producer).await?;
        let encoded = serde_json::to_value(&produced)?;
        let ttl = options.ttl.unwrap_or(self.config.default_ttl);

        match self.store.set(key, encoded, ttl).await {
            Ok(()) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    key = key,
                    ttl_secs = ttl.as_secs(),
                    "computed value stored"
                );
            }
            Err(error) if self.config.fallback_to_producer => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    key = key,
                    error = %error,
                    "failed to store computed value"
                );
            }
            Err(error) => return Err(error),
        }

        Ok(produced)
    }

    /// Deletes a single entry; absent keys are a no-op.
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        self.store.delete(key).await?;
        tracing::debug!(target: TRACING_TARGET, key = key, "cache entry invalidated");
        Ok(())
    }

    /// Deletes all entries matching a glob pattern, returning how many were
    /// removed.
    ///
    /// When the store lacks pattern scanning this is a logged no-op returning
    /// zero, never an error to the caller.
    pub async fn invalidate_by_pattern(&self, pattern: &str) -> Result<u64> {
        match self.store.delete_pattern(pattern).await {
            Ok(deleted) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    pattern = pattern,
                    deleted = deleted,
                    "cache entries invalidated by pattern"
                );
                Ok(deleted)
            }
            Err(Error::PatternUnsupported) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    pattern = pattern,
                    "cache store does not support pattern invalidation, skipping"
                );
                Ok(0)
            }
            Err(error) => Err(error),
        }
    }
}

/// Runs the producer, wrapping its failure as [`Error::Producer`].
async fn produce<T, F, Fut, E>(producer: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxedError>,
{
    producer().await.map_err(|error| Error::Producer(error.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::store::MemoryStore;

    /// Store that fails every operation, simulating an unreachable backend.
    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<Value>> {
            Err(Error::unavailable(std::io::Error::other("down")))
        }
        async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> Result<()> {
            Err(Error::unavailable(std::io::Error::other("down")))
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            Err(Error::unavailable(std::io::Error::other("down")))
        }
    }

    fn memory_cache() -> ResponseCache {
        ResponseCache::new(Arc::new(MemoryStore::new()))
    }

    async fn fetch(
        cache: &ResponseCache,
        key: &str,
        options: FetchOptions,
        calls: &AtomicUsize,
        value: u64,
    ) -> Result<u64> {
        cache
            .get_or_compute(key, options, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::io::Error>(value)
            })
            .await
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let cache = memory_cache();
        let calls = AtomicUsize::new(0);

        let first = fetch(&cache, "k", FetchOptions::default(), &calls, 7).await.unwrap();
        let second = fetch(&cache, "k", FetchOptions::default(), &calls, 8).await.unwrap();

        assert_eq!(first, 7);
        assert_eq!(second, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn skip_cache_always_invokes_producer() {
        let cache = memory_cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            fetch(&cache, "k", FetchOptions::bypass(), &calls, 1).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Nothing was stored by the bypassing calls.
        let value = fetch(&cache, "k", FetchOptions::default(), &calls, 2).await.unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn force_refresh_overwrites_cached_value() {
        let cache = memory_cache();
        let calls = AtomicUsize::new(0);

        fetch(&cache, "k", FetchOptions::default(), &calls, 1).await.unwrap();
        let refreshed = fetch(&cache, "k", FetchOptions::refresh(), &calls, 2).await.unwrap();
        assert_eq!(refreshed, 2);

        // A subsequent non-forced call sees the new value without recomputing.
        let cached = fetch(&cache, "k", FetchOptions::default(), &calls, 3).await.unwrap();
        assert_eq!(cached, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn producer_failure_propagates_and_is_not_cached() {
        let cache = memory_cache();

        let result = cache
            .get_or_compute("k", FetchOptions::default(), || async {
                Err::<u64, _>(std::io::Error::other("compute exploded"))
            })
            .await;
        assert!(matches!(result, Err(Error::Producer(_))));

        // The failed computation left nothing behind.
        let calls = AtomicUsize::new(0);
        let value = fetch(&cache, "k", FetchOptions::default(), &calls, 9).await.unwrap();
        assert_eq!(value, 9);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn per_call_ttl_override_expires() {
        let cache = memory_cache();
        let calls = AtomicUsize::new(0);
        let options = FetchOptions::default().with_ttl(Duration::from_millis(10));

        fetch(&cache, "k", options, &calls, 1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let value = fetch(&cache, "k", FetchOptions::default(), &calls, 2).await.unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_missing_key_is_ok() {
        let cache = memory_cache();
        cache.invalidate("never-set").await.unwrap();
    }

    #[tokio::test]
    async fn invalidate_forces_recompute() {
        let cache = memory_cache();
        let calls = AtomicUsize::new(0);
        let fingerprint = RequestFingerprint::new("/providers").with_kwarg("page", 1);
        let key = cache.derive_key(&fingerprint);

        fetch(&cache, &key, FetchOptions::default(), &calls, 1).await.unwrap();
        cache.invalidate(&key).await.unwrap();
        fetch(&cache, &key, FetchOptions::default(), &calls, 2).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn pattern_invalidation_removes_matching_entries() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::with_config(
            store,
            CacheConfig {
                key_prefix: "view".to_string(),
                ..CacheConfig::default()
            },
        );
        let calls = AtomicUsize::new(0);

        let key_a = cache.derive_key(&RequestFingerprint::new("/a"));
        let key_b = cache.derive_key(&RequestFingerprint::new("/b"));
        fetch(&cache, &key_a, FetchOptions::default(), &calls, 1).await.unwrap();
        fetch(&cache, &key_b, FetchOptions::default(), &calls, 2).await.unwrap();

        let deleted = cache.invalidate_by_pattern("view:*").await.unwrap();
        assert_eq!(deleted, 2);

        fetch(&cache, &key_a, FetchOptions::default(), &calls, 3).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn pattern_invalidation_is_a_noop_without_store_support() {
        struct PlainStore(MemoryStore);

        #[async_trait]
        impl CacheStore for PlainStore {
            async fn get(&self, key: &str) -> Result<Option<Value>> {
                self.0.get(key).await
            }
            async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
                self.0.set(key, value, ttl).await
            }
            async fn delete(&self, key: &str) -> Result<()> {
                self.0.delete(key).await
            }
            // No delete_pattern override: the trait default reports
            // PatternUnsupported.
        }

        let cache = ResponseCache::new(Arc::new(PlainStore(MemoryStore::new())));
        let deleted = cache.invalidate_by_pattern("view:*").await.unwrap();
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn unavailable_store_falls_back_to_producer() {
        let cache = ResponseCache::new(Arc::new(DownStore));
        let calls = AtomicUsize::new(0);

        let first = fetch(&cache, "k", FetchOptions::default(), &calls, 5).await.unwrap();
        let second = fetch(&cache, "k", FetchOptions::default(), &calls, 6).await.unwrap();

        assert_eq!(first, 5);
        assert_eq!(second, 6);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unavailable_store_surfaces_without_fallback() {
        let cache = ResponseCache::with_config(
            Arc::new(DownStore),
            CacheConfig {
                fallback_to_producer: false,
                ..CacheConfig::default()
            },
        );
        let calls = AtomicUsize::new(0);

        let result = fetch(&cache, "k", FetchOptions::default(), &calls, 5).await;
        assert!(matches!(result, Err(Error::Unavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn corrupt_cached_value_is_recomputed() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("fimed:k", Value::String("not a number".into()), Duration::from_secs(60))
            .await
            .unwrap();

        let cache = ResponseCache::new(store);
        let calls = AtomicUsize::new(0);
        let value = fetch(&cache, "fimed:k", FetchOptions::default(), &calls, 4).await.unwrap();

        assert_eq!(value, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
