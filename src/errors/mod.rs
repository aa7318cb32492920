//! # Error Handling
//!
//! This module provides error handling for the Portway gateway.
//! It defines custom error types using `thiserror` together with the
//! crate-wide `Result` alias and the HTTP status/name mapping used when
//! errors are written to the wire.

mod tls;
mod types;

pub use tls::TlsError;
pub use types::GatewayError;

/// Custom result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
