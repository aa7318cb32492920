use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};
use url::form_urlencoded;
use uuid::Uuid;

use crate::broker::{Params, ServiceBroker};
use crate::errors::GatewayError;
use crate::routing::{merge_params, Resolution, RouteTable};
use crate::server::assets::AssetServer;
use crate::server::body::parse_body;
use crate::server::materialize::materialize;

/// Upper bound on buffered request bodies, independent of per-parser limits.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared, read-only state for the request pipeline.
#[derive(Clone)]
pub struct GatewayState {
    pub table: Arc<RouteTable>,
    pub broker: Arc<dyn ServiceBroker>,
    pub assets: Option<Arc<AssetServer>>,
    pub request_timeout: Option<Duration>,
}

/// Build the axum router for the gateway. Routing is dynamic and
/// config-driven, so everything funnels through a single fallback handler;
/// the middleware assigns the correlation id and the request span.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .fallback(handle_request)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Assign a request id, wrap the pipeline in a request span, and echo the id
/// as `Request-Id` on every response, error paths included.
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("Request-Id", value);
    }
    response
}

async fn handle_request(State(state): State<GatewayState>, request: Request) -> Response {
    match state.request_timeout {
        Some(timeout) => {
            let timeout_ms = timeout.as_millis() as u64;
            match tokio::time::timeout(timeout, process(state, request)).await {
                Ok(response) => response,
                Err(_) => {
                    warn!(timeout_ms, "Request deadline elapsed, cancelling pipeline");
                    GatewayError::RequestTimeout { timeout_ms }.into_response()
                }
            }
        }
        None => process(state, request).await,
    }
}

/// The resolution pipeline: route → body parsing → broker → materializer,
/// with asset fall-through on a routing miss.
async fn process(state: GatewayState, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = parse_query(request.uri().query());

    let resolution = match state.table.resolve(&method, &path) {
        Ok(resolution) => resolution,
        Err(err) => return err.into_response(),
    };

    let (mount_index, action) = match resolution {
        Resolution::Action { mount_index, action } => (mount_index, action),
        Resolution::PassThrough => {
            if let Some(assets) = &state.assets {
                if let Some(response) = assets.serve(&method, &path).await {
                    return response;
                }
            }
            return GatewayError::NotFound.into_response();
        }
    };

    let mount = state.table.mount(mount_index);
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok());

    let body = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return GatewayError::internal(format!("Failed to read request body: {}", err))
                .into_response()
        }
    };

    let parsed = match parse_body(mount.body_parsers.as_ref(), content_type.as_ref(), &body) {
        Ok(parsed) => parsed,
        Err(err) => return err.into_response(),
    };

    let params = merge_params(query, parsed);

    info!(action = %action, "Invoking action");
    match state.broker.invoke(&action, params).await {
        Ok(result) => materialize(result),
        Err(err) => {
            let err = GatewayError::from(err);
            warn!(status = err.status_code(), error = %err, "Broker invocation failed");
            err.into_response()
        }
    }
}

fn parse_query(query: Option<&str>) -> Params {
    match query {
        Some(query) => form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect(),
        None => Params::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{ActionResult, BrokerError};
    use crate::config::GatewayConfig;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    struct EchoBroker;

    #[async_trait]
    impl ServiceBroker for EchoBroker {
        async fn invoke(&self, action: &str, params: Params) -> Result<ActionResult, BrokerError> {
            match action {
                "test.hello" => Ok(ActionResult::Text("Hello Moleculer".into())),
                "test.echo" => Ok(ActionResult::Structured(Value::Object(params))),
                "test.slow" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(ActionResult::Null)
                }
                _ => Err(BrokerError::service_not_found(action)),
            }
        }
    }

    fn router(config: &str, timeout: Option<Duration>) -> Router {
        let config: GatewayConfig = serde_json::from_str(config).unwrap();
        let state = GatewayState {
            table: Arc::new(RouteTable::from_config(&config).unwrap()),
            broker: Arc::new(EchoBroker),
            assets: None,
            request_timeout: timeout,
        };
        build_router(state)
    }

    #[tokio::test]
    async fn test_request_id_present_on_success_and_error() {
        let app = router(r#"{}"#, None);

        let ok = app
            .clone()
            .oneshot(Request::builder().uri("/test/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(ok.headers().contains_key("Request-Id"));

        let missing = app
            .oneshot(Request::builder().uri("/no/such/thing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_IMPLEMENTED);
        assert!(missing.headers().contains_key("Request-Id"));
    }

    #[tokio::test]
    async fn test_body_overrides_query_on_merge() {
        let app = router(r#"{}"#, None);
        let request = Request::builder()
            .method("POST")
            .uri("/test/echo?name=A&keep=q")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{ "name": "B" }"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let echoed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(echoed["name"], json!("B"));
        assert_eq!(echoed["keep"], json!("q"));
    }

    #[tokio::test]
    async fn test_timeout_yields_504() {
        let app = router(r#"{}"#, Some(Duration::from_millis(20)));
        let request = Request::builder().uri("/test/slow").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 504);
        assert_eq!(body["name"], "RequestTimeout");
    }

    #[tokio::test]
    async fn test_parser_failure_never_reaches_broker() {
        let app = router(r#"{}"#, None);
        let request = Request::builder()
            .method("POST")
            .uri("/test/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("invalid"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["name"], "InvalidRequestBodyError");
        assert_eq!(body["data"]["body"], "invalid");
    }
}
