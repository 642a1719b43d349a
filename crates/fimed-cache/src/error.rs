//! Error types and utilities for cache operations.

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for all cache operations in this crate.
///
/// This is a convenience type alias that defaults to using [`Error`] as the
/// error type. Most functions in this crate return this type for consistent
/// error handling.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying cache store could not be reached.
    ///
    /// Callers configured with producer fallback never observe this from
    /// `get_or_compute`; they degrade to always-compute instead.
    #[error("cache store unavailable: {source}")]
    Unavailable {
        #[source]
        source: BoxedError,
    },

    /// Serialization errors when encoding or decoding cached values.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store lacks pattern-delete capability.
    #[error("pattern invalidation is not supported by this store")]
    PatternUnsupported,

    /// The invalidation pattern could not be compiled into a matcher.
    #[error("invalid invalidation pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: BoxedError,
    },

    /// The wrapped computation itself failed; never cached.
    #[error("producer failed: {0}")]
    Producer(#[source] BoxedError),
}

impl Error {
    /// Creates a new [`Error::Unavailable`] from any store error.
    pub fn unavailable(source: impl Into<BoxedError>) -> Self {
        Self::Unavailable {
            source: source.into(),
        }
    }

    /// Returns `true` if the store itself was unreachable.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Returns `true` if the error came out of the wrapped computation.
    #[must_use]
    pub fn is_producer(&self) -> bool {
        matches!(self, Self::Producer(_))
    }
}
