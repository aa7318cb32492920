use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::TryStreamExt;
use serde_json::Value;
use tracing::error;

use crate::broker::ActionResult;

/// Convert a polymorphic action result into an HTTP response.
///
/// | Variant | Content-Type | Body |
/// |---|---|---|
/// | `Null` | unset | empty |
/// | `Opaque` | `application/json` | empty |
/// | `Text` / `Number` / `Bool` | `text/plain` | textual form |
/// | `Bytes` | `application/octet-stream` | the bytes, `Content-Length` set |
/// | `Stream` | `application/octet-stream` | chunked until EOF |
/// | `Structured` Buffer shape | `application/octet-stream` | decoded bytes |
/// | other `Structured` | `application/json` | canonical JSON |
///
/// The `Request-Id` header is added centrally by middleware so error paths
/// carry it too.
pub fn materialize(result: ActionResult) -> Response {
    match result {
        ActionResult::Null => (StatusCode::OK, Body::empty()).into_response(),
        ActionResult::Opaque => {
            (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], Body::empty())
                .into_response()
        }
        ActionResult::Text(text) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], text).into_response()
        }
        ActionResult::Number(number) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], number.to_string())
                .into_response()
        }
        ActionResult::Bool(flag) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], flag.to_string())
                .into_response()
        }
        ActionResult::Bytes(bytes) => octet_stream_response(bytes),
        ActionResult::Stream(stream) => {
            // Errors surfacing mid-stream arrive after the status line has
            // been flushed: log them and let the connection terminate.
            let stream = stream.inspect_err(|err| {
                error!(error = %err, "Action byte stream failed mid-response");
            });
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/octet-stream")],
                Body::from_stream(stream),
            )
                .into_response()
        }
        ActionResult::Structured(value) => match decode_buffer_object(&value) {
            Some(bytes) => octet_stream_response(bytes),
            None => (StatusCode::OK, Json(value)).into_response(),
        },
    }
}

fn octet_stream_response(bytes: Bytes) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
        ],
        bytes,
    )
        .into_response()
}

/// Detect the serialized-buffer object shape `{ "type": "Buffer",
/// "data": [..] }` and decode its bytes.
fn decode_buffer_object(value: &Value) -> Option<Bytes> {
    if value.get("type")?.as_str()? != "Buffer" {
        return None;
    }
    let data = value.get("data")?.as_array()?;
    let bytes = data
        .iter()
        .map(|n| n.as_u64().filter(|b| *b <= u8::MAX as u64).map(|b| b as u8))
        .collect::<Option<Vec<u8>>>()?;
    Some(Bytes::from(bytes))
}
