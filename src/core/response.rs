use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Body, HeaderMap, Response, StatusCode};
use serde::Serialize;

use crate::error::MockError;

/// Represents a response from the mock service
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code
    pub status: StatusCode,

    /// HTTP headers
    pub headers: HeaderMap,

    /// Response body
    pub body: Bytes,
}

impl MockResponse {
    /// Create a new MockResponse
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Response without a body
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, HeaderMap::new(), Bytes::new())
    }

    /// JSON response
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Self, MockError> {
        let body = serde_json::to_vec(value)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self::new(status, headers, Bytes::from(body)))
    }

    /// Add a header
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Parse the body as JSON
    pub fn json_body<T: serde::de::DeserializeOwned>(&self) -> Result<T, MockError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Convert into a hyper response
    pub fn into_http(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mock_response_new() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        let body = Bytes::from("ok");

        let response = MockResponse::new(StatusCode::OK, headers.clone(), body.clone());

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers, headers);
        assert_eq!(response.body, body);
    }

    #[test]
    fn test_json_response() {
        let response = MockResponse::json(StatusCode::CREATED, &json!({"success": true})).unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(response.body, Bytes::from(r#"{"success":true}"#));
        assert_eq!(response.json_body::<serde_json::Value>().unwrap(), json!({"success": true}));
    }

    #[test]
    fn test_empty_response_with_header() {
        let response = MockResponse::empty(StatusCode::UNAUTHORIZED)
            .with_header(HeaderName::from_static("x-test"), HeaderValue::from_static("1"));

        assert!(response.body.is_empty());
        assert_eq!(response.headers.get("x-test").unwrap(), "1");
    }

    #[test]
    fn test_into_http() {
        let response = MockResponse::json(StatusCode::IM_A_TEAPOT, &json!([1, 2])).unwrap().into_http();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    }
}
