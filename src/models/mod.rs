// Models for the mock service

use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Error codes carried in the `code` field of an error envelope
pub mod codes {
    pub const INTERNAL: u32 = 1000;
    pub const INVALID_BODY: u32 = INTERNAL + 1;
    pub const NOT_FOUND: u32 = INTERNAL + 2;
    pub const METHOD_NOT_ALLOWED: u32 = INTERNAL + 3;
    pub const RATE_LIMIT_EXCEEDED: u32 = INTERNAL + 4;
    pub const FAILED_REQUEST: u32 = INTERNAL + 5;
}

/// A status code and body pair used for either success or failure replies
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseProfile {
    /// HTTP status code
    pub status: StatusCode,

    /// Response body. `None` means the service answers with a generated
    /// error envelope instead.
    pub body: Option<Value>,
}

impl ResponseProfile {
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self { status, body }
    }
}

/// Fraction of requests answered with the success profile, in `(0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SuccessRatio(f64);

impl SuccessRatio {
    /// Every request succeeds
    pub const ALWAYS: SuccessRatio = SuccessRatio(1.0);

    pub fn new(ratio: f64) -> Result<Self, ConfigError> {
        if ratio.is_nan() || ratio <= 0.0 || ratio > 1.0 {
            return Err(ConfigError::InvalidValue {
                var: "SUCCESS_RATIO",
                reason: format!("{} is outside (0, 1]", ratio),
            });
        }
        Ok(Self(ratio))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Complement of the success ratio
    pub fn failure_ratio(&self) -> f64 {
        1.0 - self.0
    }
}

impl Default for SuccessRatio {
    fn default() -> Self {
        Self::ALWAYS
    }
}

/// One logical request inside a batch. Its fields are logged, not interpreted.
pub type SubRequest = Map<String, Value>;

/// Decoded `batch` field of a batch call, in submission order
pub type BatchEnvelope = Vec<SubRequest>;

/// Per-item result of a batch call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    /// Status code chosen for the item
    pub code: u16,

    /// Chosen body, serialized to a JSON string
    pub body: String,
}

/// Structured error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorContent,
}

/// Contents of an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContent {
    /// Human readable message
    pub message: String,

    /// Error code, see [`codes`]
    pub code: u32,

    /// Trace id to cross-reference the response with the logs
    pub id: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, code: u32, trace_id: impl Into<String>) -> Self {
        Self {
            error: ErrorContent {
                message: message.into(),
                code,
                id: trace_id.into(),
            },
        }
    }

    /// Render as a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "error": {
                "message": self.error.message,
                "code": self.error.code,
                "id": self.error.id,
            }
        })
    }
}
