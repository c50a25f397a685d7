use std::sync::Arc;

use async_trait::async_trait;

use crate::core::counter::RequestCounter;
use crate::core::request::MockRequest;
use crate::core::response::MockResponse;
use crate::error::MockError;
use crate::middleware::{Middleware, MiddlewareHandler};

/// Takes the next counter value for single-route requests. Only requests that
/// made it past authentication and rate limiting are counted.
pub struct CounterMiddleware {
    counter: Arc<RequestCounter>,
}

impl CounterMiddleware {
    pub fn new(counter: Arc<RequestCounter>) -> Self {
        Self { counter }
    }
}

#[async_trait]
impl Middleware for CounterMiddleware {
    async fn process_request(
        &self,
        mut request: MockRequest,
        next: Arc<dyn MiddlewareHandler>,
    ) -> Result<MockResponse, MockError> {
        let sequence = self.counter.increment();
        tracing::debug!(request_id = %request.request_id, sequence, "Request counted");

        request.sequence = Some(sequence);
        next.handle(request).await
    }

    fn name(&self) -> &str {
        "counter"
    }
}
