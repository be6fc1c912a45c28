//! Transport-neutral handler request and response

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Content type used by JSON handler responses
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// An HTTP request as seen by a block handler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HandlerRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Default::default()
        }
    }

    /// POST request carrying the given JSON document
    pub fn post_json(value: &Value) -> Self {
        Self::new("POST")
            .with_header("content-type", JSON_CONTENT_TYPE)
            .with_body(value.to_string().into_bytes())
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First header with the given name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A handler's reply, converted to HTTP by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub status: u16,
    pub content_type: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HandlerResponse {
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &Value) -> Self {
        Self::new(status, JSON_CONTENT_TYPE, value.to_string().into_bytes())
    }

    /// JSON error of the form `{"error": ...}`
    pub fn json_error(status: u16, error: Value) -> Self {
        Self::json(status, &json!({ "error": error }))
    }

    pub fn success() -> Self {
        Self::json(200, &json!({ "result": "success" }))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json_body(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = HandlerRequest::new("post").with_header("Content-Type", "text/plain");
        assert_eq!(request.header("content-type"), Some("text/plain"));
        assert!(request.is_post());
        assert!(request.header("accept").is_none());
    }

    #[test]
    fn test_json_error_shape() {
        let response = HandlerResponse::json_error(405, json!("Method must be POST"));
        assert_eq!(response.status, 405);
        assert_eq!(response.content_type, JSON_CONTENT_TYPE);
        assert_eq!(
            response.json_body().unwrap(),
            json!({"error": "Method must be POST"})
        );
        assert!(!response.is_success());
    }

    #[test]
    fn test_post_json_body_decodes() {
        let request = HandlerRequest::post_json(&json!({"values": {"display_name": "x"}}));
        let body: Value = request.json().unwrap();
        assert_eq!(body["values"]["display_name"], "x");
    }
}
