//! Common test utilities for the gateway integration tests.
//!
//! Provides the test broker with the canonical `test.*` / `math.*` actions
//! and helpers for spawning a gateway on an ephemeral port.

#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use portway::{ActionResult, BrokerError, Gateway, GatewayConfig, GatewayHandle, Params, ServiceBroker};
use serde_json::{json, Value};

static INIT_CRYPTO: Once = Once::new();

/// Install the ring crypto provider once per test run so TLS clients and
/// listeners agree on a process default.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        use rustls::crypto::{ring, CryptoProvider};
        if CryptoProvider::get_default().is_none() {
            let _ = ring::default_provider().install_default();
        }
    });
}

/// Broker exposing the fixed action set the end-to-end scenarios drive.
pub struct TestBroker;

#[async_trait]
impl ServiceBroker for TestBroker {
    async fn invoke(&self, action: &str, params: Params) -> Result<ActionResult, BrokerError> {
        match action {
            "test.hello" => Ok(ActionResult::Text("Hello Moleculer".into())),
            "test.greeter" => {
                let name = string_param(&params, "name")?;
                Ok(ActionResult::Text(format!("Hello {}", name)))
            }
            "math.add" => {
                let a = number_param(&params, "a")?;
                let b = number_param(&params, "b")?;
                Ok(ActionResult::Number(a + b))
            }
            "test.null" => Ok(ActionResult::Null),
            "test.flag" => Ok(ActionResult::Bool(true)),
            "test.object" => Ok(ActionResult::Structured(json!({
                "id": 5,
                "name": "Jameson"
            }))),
            "test.bytes" => Ok(ActionResult::Bytes(Bytes::from_static(b"\x01\x02\x03"))),
            "test.stream" => {
                let chunks: Vec<std::io::Result<Bytes>> = vec![
                    Ok(Bytes::from_static(b"chunk1")),
                    Ok(Bytes::from_static(b"chunk2")),
                ];
                Ok(ActionResult::Stream(Box::pin(stream::iter(chunks))))
            }
            "test.buffer" => Ok(ActionResult::Structured(json!({
                "type": "Buffer",
                "data": [72, 105]
            }))),
            "test.fail" => Err(BrokerError::service("Something went wrong")),
            "test.teapot" => Err(BrokerError::Service {
                name: "ServiceError".into(),
                message: "I'm a teapot".into(),
                code: Some(418),
                data: None,
            }),
            "test.slow" => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(ActionResult::Null)
            }
            _ => Err(BrokerError::service_not_found(action)),
        }
    }
}

fn string_param(params: &Params, key: &str) -> Result<String, BrokerError> {
    match params.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(BrokerError::Validation {
            message: format!("The '{}' parameter is required.", key),
            data: Some(json!([{ "field": key, "type": "required" }])),
        }),
    }
}

fn number_param(params: &Params, key: &str) -> Result<f64, BrokerError> {
    let parsed = match params.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| BrokerError::Validation {
        message: format!("The '{}' parameter must be a number.", key),
        data: Some(json!([{ "field": key, "type": "number" }])),
    })
}

/// Build a gateway config from its JSON form, forcing an ephemeral port.
pub fn config(mut value: Value) -> GatewayConfig {
    value["port"] = json!(0);
    serde_json::from_value(value).expect("gateway config")
}

/// Spawn a gateway over the test broker and wait until it is listening.
pub async fn spawn_gateway(config: GatewayConfig) -> GatewayHandle {
    let gateway = Gateway::new(config, Arc::new(TestBroker)).expect("gateway construction");
    gateway.start().await.expect("gateway start")
}

pub fn base_url(handle: &GatewayHandle) -> String {
    format!("http://{}", handle.local_addr())
}
