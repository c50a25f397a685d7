use thiserror::Error;

use crate::models::codes;

/// Mock service error types
#[derive(Debug, Error)]
pub enum MockError {
    #[error("body parsing error: {0}")]
    InvalidBody(String),

    #[error("Request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// HTTP status code mapping for mock errors
impl MockError {
    pub fn status_code(&self) -> u16 {
        match self {
            // Unknown methods are answered with 404 as well
            MockError::InvalidBody(_) => 400,
            MockError::BodyTooLarge(_) => 413,
            MockError::RouteNotFound(_) => 404,
            MockError::MethodNotAllowed(_) => 404,
            MockError::RateLimitExceeded => 429,
            MockError::AuthError(_) => 401,
            MockError::ConfigError(_) => 500,
            MockError::InternalError(_) => 500,
            MockError::SerializationError(_) => 500,
        }
    }

    /// Numeric code carried in the error envelope
    pub fn error_code(&self) -> u32 {
        match self {
            MockError::InvalidBody(_) | MockError::BodyTooLarge(_) => codes::INVALID_BODY,
            MockError::RouteNotFound(_) => codes::NOT_FOUND,
            MockError::MethodNotAllowed(_) => codes::METHOD_NOT_ALLOWED,
            MockError::RateLimitExceeded => codes::RATE_LIMIT_EXCEEDED,
            _ => codes::INTERNAL,
        }
    }

    /// Client-facing message carried in the error envelope
    pub fn public_message(&self) -> &'static str {
        match self {
            MockError::InvalidBody(_) => "body parsing error",
            MockError::BodyTooLarge(_) => "request body too large",
            MockError::RouteNotFound(_) => "not found",
            MockError::MethodNotAllowed(_) => "method not allowed",
            MockError::RateLimitExceeded => "rate limit exceeded",
            MockError::AuthError(_) => "unauthorized",
            _ => "internal error",
        }
    }
}

/// Authentication specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing or invalid API key")]
    InvalidApiKey,

    #[error("Invalid token")]
    InvalidToken,
}

/// Configuration specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {format} format for {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        format: &'static str,
        reason: String,
    },

    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("only one of API_KEY or API_TOKEN can be set")]
    ConflictingCredentials,

    #[error("method {0} is not allowed")]
    MethodNotAllowed(String),

    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidRoute { pattern: String, reason: String },
}
