//! # Service Broker Contract
//!
//! The gateway does not implement the microservice bus itself; it invokes
//! named actions through the [`ServiceBroker`] trait and materializes the
//! returned [`ActionResult`]. Brokers are shared behind an `Arc`, are
//! stateless from the gateway's point of view, and must tolerate concurrent
//! independent calls.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde_json::{Map, Value};

/// Parameter set handed to an action: query params overlaid with the parsed
/// request body (body wins on key conflicts).
pub type Params = Map<String, Value>;

/// Lazily produced response bytes, streamed to the client chunk by chunk.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Client contract over the external message-routing fabric.
///
/// Invoking an unknown action must yield [`BrokerError::ServiceNotFound`];
/// parameter validation failures must yield [`BrokerError::Validation`].
/// Cancellation follows from the invocation future being dropped.
#[async_trait]
pub trait ServiceBroker: Send + Sync {
    async fn invoke(&self, action: &str, params: Params) -> Result<ActionResult, BrokerError>;
}

/// The polymorphic value an action may return.
///
/// The original fabric discriminates result shapes at runtime; across this
/// boundary they are an explicit tagged variant so the materializer can match
/// exhaustively.
pub enum ActionResult {
    /// No value; serialized as an empty body with no content type
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// An in-memory byte buffer, served as `application/octet-stream`
    Bytes(Bytes),
    /// A lazy byte stream, served chunked as `application/octet-stream`
    Stream(ByteStream),
    /// Any JSON-shaped value (objects, arrays)
    Structured(Value),
    /// A value with no natural serialization; treated as empty JSON
    Opaque,
}

impl ActionResult {
    /// Map a JSON value onto the closest result variant.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => ActionResult::Null,
            Value::Bool(b) => ActionResult::Bool(b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => ActionResult::Number(f),
                None => ActionResult::Structured(Value::Number(n)),
            },
            Value::String(s) => ActionResult::Text(s),
            other => ActionResult::Structured(other),
        }
    }
}

impl fmt::Debug for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Null => write!(f, "Null"),
            ActionResult::Bool(b) => write!(f, "Bool({b})"),
            ActionResult::Number(n) => write!(f, "Number({n})"),
            ActionResult::Text(s) => write!(f, "Text({s:?})"),
            ActionResult::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            ActionResult::Stream(_) => write!(f, "Stream(..)"),
            ActionResult::Structured(v) => write!(f, "Structured({v})"),
            ActionResult::Opaque => write!(f, "Opaque"),
        }
    }
}

impl From<&str> for ActionResult {
    fn from(s: &str) -> Self {
        ActionResult::Text(s.to_string())
    }
}

impl From<String> for ActionResult {
    fn from(s: String) -> Self {
        ActionResult::Text(s)
    }
}

impl From<f64> for ActionResult {
    fn from(n: f64) -> Self {
        ActionResult::Number(n)
    }
}

impl From<i64> for ActionResult {
    fn from(n: i64) -> Self {
        ActionResult::Number(n as f64)
    }
}

impl From<bool> for ActionResult {
    fn from(b: bool) -> Self {
        ActionResult::Bool(b)
    }
}

impl From<Vec<u8>> for ActionResult {
    fn from(bytes: Vec<u8>) -> Self {
        ActionResult::Bytes(Bytes::from(bytes))
    }
}

impl From<Value> for ActionResult {
    fn from(value: Value) -> Self {
        ActionResult::from_value(value)
    }
}

/// Typed errors a broker may surface from an invocation.
#[derive(thiserror::Error, Debug)]
pub enum BrokerError {
    /// The action name is not registered on the bus
    #[error("Action '{action}' is not available!")]
    ServiceNotFound { action: String },

    /// Action parameter validation failed
    #[error("{message}")]
    Validation { message: String, data: Option<Value> },

    /// Any other service failure; `code` overrides the HTTP status when it
    /// falls inside 400..=599
    #[error("{message}")]
    Service { name: String, message: String, code: Option<u16>, data: Option<Value> },
}

impl BrokerError {
    /// Shorthand for an unknown-action error
    pub fn service_not_found<S: Into<String>>(action: S) -> Self {
        Self::ServiceNotFound { action: action.into() }
    }

    /// Shorthand for a parameter validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), data: None }
    }

    /// Shorthand for a generic service error without a carried code
    pub fn service<S: Into<String>>(message: S) -> Self {
        Self::Service { name: "ServiceError".into(), message: message.into(), code: None, data: None }
    }

    /// The HTTP status code this error maps onto
    pub fn status_code(&self) -> u16 {
        match self {
            BrokerError::ServiceNotFound { .. } => 501,
            BrokerError::Validation { .. } => 422,
            BrokerError::Service { code, .. } => match code {
                Some(code) if (400..=599).contains(code) => *code,
                _ => 500,
            },
        }
    }

    /// The `name` field of the wire-level error body
    pub fn error_name(&self) -> &str {
        match self {
            BrokerError::ServiceNotFound { .. } => "ServiceNotFoundError",
            BrokerError::Validation { .. } => "ValidationError",
            BrokerError::Service { name, .. } => name,
        }
    }

    /// The optional `data` payload carried by the error
    pub fn data(&self) -> Option<&Value> {
        match self {
            BrokerError::ServiceNotFound { .. } => None,
            BrokerError::Validation { data, .. } | BrokerError::Service { data, .. } => {
                data.as_ref()
            }
        }
    }
}
