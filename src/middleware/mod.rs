pub mod auth;
pub mod counter;
pub mod delay;
pub mod logging;
pub mod rate_limit;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::core::request::MockRequest;
use crate::core::response::MockResponse;
use crate::error::MockError;

/// Middleware trait for processing requests and responses
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process a request before it reaches the responder
    async fn process_request(
        &self,
        request: MockRequest,
        next: Arc<dyn MiddlewareHandler>,
    ) -> Result<MockResponse, MockError>;

    /// Get the name of this middleware
    fn name(&self) -> &str;
}

/// Handler for the next middleware in the chain
#[async_trait]
pub trait MiddlewareHandler: Send + Sync {
    /// Handle the request by passing it to the next middleware or the responder
    async fn handle(&self, request: MockRequest) -> Result<MockResponse, MockError>;
}

/// Chain of middleware handlers
#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Create a new middleware chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a middleware to the chain
    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Add a shared middleware to the chain
    pub fn add_shared(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Names of the middlewares, outermost first
    pub fn names(&self) -> Vec<String> {
        self.middlewares.iter().map(|m| m.name().to_string()).collect()
    }

    /// Build the middleware chain
    pub fn build(self, final_handler: Arc<dyn MiddlewareHandler>) -> Arc<dyn MiddlewareHandler> {
        let mut handler = final_handler;

        // Build the chain in reverse order
        for middleware in self.middlewares.into_iter().rev() {
            handler = Arc::new(MiddlewareLink {
                middleware,
                next: handler,
            });
        }

        handler
    }
}

/// Link in the middleware chain
struct MiddlewareLink {
    middleware: Arc<dyn Middleware>,
    next: Arc<dyn MiddlewareHandler>,
}

#[async_trait]
impl MiddlewareHandler for MiddlewareLink {
    async fn handle(&self, request: MockRequest) -> Result<MockResponse, MockError> {
        self.middleware.process_request(request, self.next.clone()).await
    }
}

/// Adapts a closure into the last handler of a chain
pub struct FinalHandler<F> {
    handler: F,
}

impl<F> FinalHandler<F>
where
    F: Fn(MockRequest) -> BoxFuture<'static, Result<MockResponse, MockError>> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F> MiddlewareHandler for FinalHandler<F>
where
    F: Fn(MockRequest) -> BoxFuture<'static, Result<MockResponse, MockError>> + Send + Sync,
{
    async fn handle(&self, request: MockRequest) -> Result<MockResponse, MockError> {
        (self.handler)(request).await
    }
}
