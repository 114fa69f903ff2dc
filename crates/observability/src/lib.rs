//! `flowforge-observability` — process-wide tracing setup.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use tracing::{init, init_with_filter};
