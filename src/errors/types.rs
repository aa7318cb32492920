use serde_json::{json, Value};

use crate::broker::BrokerError;
use crate::errors::TlsError;

/// Main error type for the Portway gateway.
///
/// Every variant maps onto an HTTP status and a wire-level error name via
/// [`GatewayError::status_code`] and [`GatewayError::error_name`]; the HTTP
/// layer serializes these as `{ code, name, message, data? }` bodies.
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// No API route matched and no asset matched
    #[error("Not found")]
    NotFound,

    /// A body parser failed on a well-typed request
    #[error("Invalid request body")]
    InvalidRequestBody { body: String, error: String },

    /// Whitelist rejection: the resolved action is not permitted on its mount
    #[error("Action '{action}' is not available!")]
    ServiceNotFound { action: String },

    /// The per-request deadline elapsed before the pipeline finished
    #[error("Request timed out after {timeout_ms}ms")]
    RequestTimeout { timeout_ms: u64 },

    /// Errors surfaced from the service broker
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network transport errors (bind, accept, serve)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS material errors
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// The HTTP status code this error is written with
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::NotFound => 404,
            GatewayError::InvalidRequestBody { .. } => 400,
            GatewayError::ServiceNotFound { .. } => 501,
            GatewayError::RequestTimeout { .. } => 504,
            GatewayError::Broker(err) => err.status_code(),
            GatewayError::Config(_)
            | GatewayError::Transport(_)
            | GatewayError::Io(_)
            | GatewayError::Tls(_)
            | GatewayError::Internal(_) => 500,
        }
    }

    /// The `name` field of the wire-level error body
    pub fn error_name(&self) -> &str {
        match self {
            GatewayError::NotFound => "NotFoundError",
            GatewayError::InvalidRequestBody { .. } => "InvalidRequestBodyError",
            GatewayError::ServiceNotFound { .. } => "ServiceNotFoundError",
            GatewayError::RequestTimeout { .. } => "RequestTimeout",
            GatewayError::Broker(err) => err.error_name(),
            GatewayError::Config(_)
            | GatewayError::Transport(_)
            | GatewayError::Io(_)
            | GatewayError::Tls(_)
            | GatewayError::Internal(_) => "InternalError",
        }
    }

    /// The optional `data` payload of the wire-level error body
    pub fn error_data(&self) -> Option<Value> {
        match self {
            GatewayError::InvalidRequestBody { body, error } => {
                Some(json!({ "body": body, "error": error }))
            }
            GatewayError::Broker(err) => err.data().cloned(),
            _ => None,
        }
    }
}
