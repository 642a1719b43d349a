//! Deterministic cache key derivation.
//!
//! A cache key identifies the logical invocation that produced a cacheable
//! value: the request path, the raw query string, and the handler's positional
//! and keyword arguments. Two logically identical invocations always derive
//! the same key, across processes and restarts; keyword arguments are sorted
//! before hashing so insertion order does not matter.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Separator between the caller-supplied prefix and the fingerprint digest.
pub const KEY_SEPARATOR: char = ':';

/// The logical identity of a cacheable invocation.
///
/// Built up with the `with_*` methods and hashed with [`RequestFingerprint::digest`].
/// Derivation is a pure function of the recorded inputs; no timestamps or
/// randomness enter the digest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFingerprint {
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
    path: String,
    query_string: String,
}

impl RequestFingerprint {
    /// Creates a fingerprint for the given request path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Records the raw query string.
    #[must_use]
    pub fn with_query(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    /// Appends a positional argument. Order is significant.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Records a keyword argument. Insertion order is irrelevant; keys are
    /// sorted before hashing.
    #[must_use]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Returns the canonical structure that gets hashed.
    ///
    /// Object keys are sorted at every nesting level (`serde_json::Map` is
    /// ordered by key), so the serialized form is stable.
    fn canonical(&self) -> Value {
        let mut canonical = Map::new();
        canonical.insert("args".to_string(), Value::Array(self.args.clone()));
        canonical.insert(
            "kwargs".to_string(),
            Value::Object(self.kwargs.clone().into_iter().collect()),
        );
        canonical.insert("path".to_string(), Value::String(self.path.clone()));
        canonical.insert(
            "query_string".to_string(),
            Value::String(self.query_string.clone()),
        );
        Value::Object(canonical)
    }

    /// Returns the SHA-256 digest of the canonical form as a hex string.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical().to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Derives the final cache key: `{prefix}:{sha256-hex}`.
#[must_use]
pub fn derive_key(prefix: &str, fingerprint: &RequestFingerprint) -> String {
    format!("{prefix}{KEY_SEPARATOR}{}", fingerprint.digest())
}
