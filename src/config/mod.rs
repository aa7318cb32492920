//! # Configuration Management
//!
//! Configuration for the gateway: the listener, the global path prefix, the
//! mounted routes with their whitelists/aliases/body parsers, optional static
//! assets, and optional TLS material. Everything here is immutable once a
//! gateway has been started.

mod settings;
mod tls;

pub use settings::{
    AliasConfig, AssetsConfig, BodyParsers, GatewayConfig, HttpsConfig, ObservabilityConfig,
    ParserOptions, ParserToggle, RouteConfig,
};
pub use tls::build_tls_acceptor;
