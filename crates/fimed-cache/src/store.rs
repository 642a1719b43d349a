//! The pluggable store seam and the in-memory reference store.
//!
//! The cache layer owns no entries itself; it talks to exactly one
//! [`CacheStore`]. Production deployments back this trait with their own
//! key-value system. [`MemoryStore`] is the reference implementation used in
//! tests and single-process deployments.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// Tracing target for store operations.
const TRACING_TARGET: &str = "fimed_cache::store";

/// An externally supplied key-value store holding cache entries.
///
/// All operations must be safe for concurrent use by multiple callers;
/// ordering between a `set` and a concurrent `get`/`delete` on the same key
/// follows the store's own consistency guarantees.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks up a value by key. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores a value under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;

    /// Deletes a single entry. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Deletes all entries whose key matches a glob pattern (`*`, `?`),
    /// returning how many were removed.
    ///
    /// Stores without pattern scanning keep this default body and report
    /// [`Error::PatternUnsupported`]; the cache layer downgrades that to a
    /// logged no-op.
    async fn delete_pattern(&self, pattern: &str) -> Result<u64> {
        let _ = pattern;
        Err(Error::PatternUnsupported)
    }
}

/// One stored value with its expiry deadline.
#[derive(Debug, Clone)]
struct StoredEntry {
    value: Value,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-memory [`CacheStore`] with TTL expiry and glob pattern deletes.
///
/// Expired entries are dropped lazily on read; long-lived processes can also
/// run [`MemoryStore::purge_expired`] periodically to reclaim memory for keys
/// that are never read again.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including not-yet-purged expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Drops all expired entries, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - entries.len();

        if purged > 0 {
            tracing::debug!(
                target: TRACING_TARGET,
                purged = purged,
                "expired cache entries purged"
            );
        }

        purged
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.entries.write().await;

        match entries.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                entries.remove(key);
                tracing::debug!(target: TRACING_TARGET, key = key, "cache entry expired");
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        let entry = StoredEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64> {
        let matcher = glob_matcher(pattern)?;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !matcher.is_match(key));
        Ok((before - entries.len()) as u64)
    }
}

/// Compiles a glob pattern (`*` any run, `?` any single char) into a matcher.
fn glob_matcher(pattern: &str) -> Result<Regex> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }
    translated.push('$');

    Regex::new(&translated).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source: Box::new(source),
    })
}
