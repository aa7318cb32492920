//! # Portway
//!
//! Portway is an HTTP API gateway that exposes a microservice bus to external
//! HTTP clients. Incoming requests are resolved through layered mounts,
//! aliases, and whitelists to exactly one named action, invoked on a
//! [`broker::ServiceBroker`], and the polymorphic result is materialized back
//! into an HTTP response.
//!
//! ## Architecture
//!
//! ```text
//! HTTP request → Server Front → Request Resolver → Body Parsers
//!                     ↓               ↓ (miss)          ↓
//!               Request-Id        Asset Server    Broker Invoke
//!                                     ↓                ↓
//!                                    404          Materializer → HTTP response
//! ```
//!
//! ## Core Components
//!
//! - **Route Table / Resolver**: compiled mounts with whitelist matchers and
//!   ordered alias pairs, resolved deterministically per request
//! - **Broker Adapter**: async trait contract over the message-routing fabric
//! - **Materializer**: tagged action results serialized with the right
//!   status, headers, and content type, streaming included
//! - **Service Facade**: [`Gateway`] construction from configuration with a
//!   gracefully stoppable [`GatewayHandle`]

pub mod broker;
pub mod config;
pub mod errors;
pub mod observability;
pub mod routing;
pub mod server;

// Re-export commonly used types and traits
pub use broker::{ActionResult, BrokerError, Params, ServiceBroker};
pub use config::GatewayConfig;
pub use errors::{GatewayError, Result};
pub use server::{Gateway, GatewayHandle};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
