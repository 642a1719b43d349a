#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod health;
mod metrics;

pub use crate::health::{ComponentHealth, ComponentStatus, HealthReport, MAX_MESSAGE_LEN};
pub use crate::metrics::MetricsRegistry;
