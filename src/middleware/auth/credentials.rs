use crate::core::request::MockRequest;
use crate::error::AuthError;
use crate::middleware::auth::AuthService;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Static API key expected in the `X-API-KEY` header
pub struct ApiKeyAuth {
    key: String,
}

impl ApiKeyAuth {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl AuthService for ApiKeyAuth {
    fn authenticate(&self, request: &MockRequest) -> Result<(), AuthError> {
        match request.header(API_KEY_HEADER) {
            Some(key) if key == self.key => Ok(()),
            _ => Err(AuthError::InvalidApiKey),
        }
    }

    fn scheme(&self) -> &str {
        "api-key"
    }
}

/// Static bearer token expected in the `Authorization` header
pub struct BearerTokenAuth {
    token: String,
}

impl BearerTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Extract the token from the Authorization header
    fn extract_token(request: &MockRequest) -> Option<String> {
        request
            .header("authorization")
            .and_then(|header| header.strip_prefix("Bearer ").map(str::to_string))
    }
}

impl AuthService for BearerTokenAuth {
    fn authenticate(&self, request: &MockRequest) -> Result<(), AuthError> {
        match Self::extract_token(request) {
            Some(token) if token == self.token => Ok(()),
            _ => Err(AuthError::InvalidToken),
        }
    }

    fn scheme(&self) -> &str {
        "bearer"
    }
}
