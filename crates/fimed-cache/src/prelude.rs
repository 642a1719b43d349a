//! Prelude module for fimed-cache.
//!
//! Re-exports the most commonly used types so that a single
//! `use fimed_cache::prelude::*;` brings in everything a handler needs.

pub use crate::cache::{CacheConfig, FetchOptions, ResponseCache};
pub use crate::error::{BoxedError, Error, Result};
pub use crate::key::{RequestFingerprint, derive_key};
pub use crate::store::{CacheStore, MemoryStore};
