//! Conversion between axum requests/responses and handler shapes

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri},
    response::Response,
};
use studio_bridge_core::{HandlerRequest, HandlerResponse};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Build a handler request from the parts of an inbound HTTP request.
///
/// Header values that are not visible ASCII are dropped.
pub fn handler_request(method: &Method, uri: &Uri, headers: &HeaderMap, body: Bytes) -> HandlerRequest {
    let mut request = HandlerRequest::new(method.as_str())
        .with_path(uri.path())
        .with_query(uri.query().unwrap_or_default())
        .with_body(body.to_vec());

    for (name, value) in headers {
        match value.to_str() {
            Ok(value) => request = request.with_header(name.as_str(), value),
            Err(_) => debug!(header = %name, "Skipping non-text header"),
        }
    }

    request
}

/// Turn a handler response into an HTTP response, copying the status,
/// content type, headers and body verbatim.
pub fn into_http_response(response: HandlerResponse) -> ApiResult<Response> {
    let status = StatusCode::from_u16(response.status).map_err(|e| {
        ApiError::internal_server_error(format!("Handler returned invalid status: {}", e))
    })?;

    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, response.content_type);
    for (name, value) in response.headers {
        builder = builder.header(name, value);
    }

    builder.body(Body::from(response.body)).map_err(|e| {
        ApiError::internal_server_error(format!("Handler returned invalid response: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_handler_request_copies_parts() {
        let uri: Uri = "/v1/lti/block-v1:A+B+C+type@html+block@x?preview=1".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-binary", HeaderValue::from_bytes(&[0xfa, 0xfb]).unwrap());

        let request = handler_request(&Method::POST, &uri, &headers, Bytes::from_static(b"{}"));

        assert!(request.is_post());
        assert_eq!(request.path, "/v1/lti/block-v1:A+B+C+type@html+block@x");
        assert_eq!(request.query, "preview=1");
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert!(request.header("x-binary").is_none());
        assert_eq!(request.body, b"{}");
    }

    #[tokio::test]
    async fn test_response_is_copied_verbatim() {
        let handler_response =
            HandlerResponse::json(400, &json!({"error": "Invalid JSON"})).with_header("x-block", "html");

        let response = into_http_response(handler_response).unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()["x-block"], "html");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            json!({"error": "Invalid JSON"})
        );
    }

    #[test]
    fn test_invalid_status_is_an_error() {
        let err = into_http_response(HandlerResponse::new(42, "text/plain", Vec::new())).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
