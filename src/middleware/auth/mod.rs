pub mod credentials;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AuthConfig;
use crate::core::request::MockRequest;
use crate::core::response::MockResponse;
use crate::error::{AuthError, MockError};
use crate::middleware::{Middleware, MiddlewareHandler};

pub use credentials::{ApiKeyAuth, BearerTokenAuth};

/// Value of the `WWW-Authenticate` header sent with rejected bearer tokens
pub const AUTHENTICATE_HEADER: &str =
    r#"Bearer realm="example", error="invalid_token", error_description="invalid access token""#;

/// Authentication service interface
pub trait AuthService: Send + Sync {
    /// Check the credentials carried by a request
    fn authenticate(&self, request: &MockRequest) -> Result<(), AuthError>;

    /// Short name of the scheme, used in logs
    fn scheme(&self) -> &str;
}

/// Authentication middleware
pub struct AuthMiddleware {
    auth_service: Arc<dyn AuthService>,
}

impl AuthMiddleware {
    /// Create a new AuthMiddleware with the specified authentication service
    pub fn new(auth_service: Arc<dyn AuthService>) -> Self {
        Self { auth_service }
    }

    /// Build the middleware for the configured credential, if any
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        let service: Arc<dyn AuthService> = match (&config.api_key, &config.api_token) {
            (Some(key), _) => Arc::new(ApiKeyAuth::new(key.clone())),
            (None, Some(token)) => Arc::new(BearerTokenAuth::new(token.clone())),
            (None, None) => return None,
        };
        Some(Self::new(service))
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn process_request(
        &self,
        request: MockRequest,
        next: Arc<dyn MiddlewareHandler>,
    ) -> Result<MockResponse, MockError> {
        match self.auth_service.authenticate(&request) {
            Ok(()) => {
                tracing::debug!(
                    request_id = %request.request_id,
                    "Authentication successful ({})",
                    self.auth_service.scheme()
                );
                next.handle(request).await
            }
            Err(err) => {
                tracing::warn!(request_id = %request.request_id, "Authentication failed: {}", err);
                Err(MockError::AuthError(err))
            }
        }
    }

    fn name(&self) -> &str {
        "auth"
    }
}
