//! Prelude module for fimed-server.
//!
//! This module re-exports the most commonly used types and traits from
//! fimed-server, making it easy to import everything you need with a single
//! `use` statement.
//!
//! # Example
//!
//! ```rust
//! use fimed_server::prelude::*;
//! ```

// Re-export handler types
pub use crate::handler::{ComponentResponse, HealthReportResponse, LivenessResponse, routes};
// Re-export service types
pub use crate::service::*;
