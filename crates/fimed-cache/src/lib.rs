#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod cache;
mod error;
mod key;
mod store;

pub mod prelude;

pub use crate::cache::{CacheConfig, FetchOptions, ResponseCache};
pub use crate::error::{BoxedError, Error, Result};
pub use crate::key::{KEY_SEPARATOR, RequestFingerprint, derive_key};
pub use crate::store::{CacheStore, MemoryStore};
