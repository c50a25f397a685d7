use std::net::IpAddr;

use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri, Version};

use crate::utils::{generate_request_id, parse_header_to_string};

/// Represents a request to the mock service
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// HTTP method
    pub method: Method,

    /// Request URI
    pub uri: Uri,

    /// HTTP version
    pub version: Version,

    /// HTTP headers
    pub headers: HeaderMap,

    /// Request body
    pub body: Bytes,

    /// Client IP address
    pub client_ip: Option<IpAddr>,

    /// Request ID for tracing
    pub request_id: String,

    /// Counter value assigned to this request, once counted
    pub sequence: Option<u64>,
}

impl MockRequest {
    /// Create a new MockRequest
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        client_ip: Option<IpAddr>,
    ) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers,
            body,
            client_ip,
            request_id: generate_request_id(),
            sequence: None,
        }
    }

    /// Set the HTTP version
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).and_then(parse_header_to_string)
    }

    /// One line summary, e.g. `POST http://localhost:8080/v1/mock/foo HTTP/1.1 from https://origin`
    pub fn describe(&self) -> String {
        let scheme = self.uri.scheme_str().unwrap_or("http");
        let host = self
            .uri
            .authority()
            .map(|a| a.to_string())
            .or_else(|| self.header("host"))
            .unwrap_or_default();
        let path = self
            .uri
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/");
        let origin = self.header("origin").unwrap_or_else(|| "unknown".to_string());

        format!(
            "{} {}://{}{} {:?} from {}",
            self.method, scheme, host, path, self.version, origin
        )
    }
}
