//! # Observability Infrastructure
//!
//! Structured logging setup for the gateway. Metrics and tracing exporters
//! are intentionally absent; hosts plug their own sinks into the `tracing`
//! ecosystem.

mod logging;

pub use logging::init_logging;
