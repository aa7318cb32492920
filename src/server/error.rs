use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::errors::GatewayError;

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // A bare route/asset miss is plain text; every other error carries
        // the structured JSON body.
        if matches!(self, GatewayError::NotFound) {
            return (status, [(header::CONTENT_TYPE, "text/plain")], "Not found").into_response();
        }

        let mut body = json!({
            "code": status.as_u16(),
            "name": self.error_name(),
            "message": self.to_string(),
        });
        if let Some(data) = self.error_data() {
            body["data"] = data;
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerError;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_is_plain_text() {
        let response = GatewayError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Not found");
    }

    #[tokio::test]
    async fn test_service_not_found_body() {
        let response =
            GatewayError::ServiceNotFound { action: "other.action".into() }.into_response();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        let body = body_json(response).await;
        assert_eq!(body["code"], 501);
        assert_eq!(body["name"], "ServiceNotFoundError");
        assert_eq!(body["message"], "Action 'other.action' is not available!");
    }

    #[tokio::test]
    async fn test_invalid_body_includes_data() {
        let response = GatewayError::InvalidRequestBody {
            body: "invalid".into(),
            error: "expected value".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["name"], "InvalidRequestBodyError");
        assert_eq!(body["message"], "Invalid request body");
        assert_eq!(body["data"]["body"], "invalid");
    }

    #[tokio::test]
    async fn test_broker_carried_code_sets_status() {
        let err: GatewayError = BrokerError::Service {
            name: "ServiceError".into(),
            message: "teapot".into(),
            code: Some(418),
            data: None,
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status().as_u16(), 418);
        let body = body_json(response).await;
        assert_eq!(body["code"], 418);
    }
}
