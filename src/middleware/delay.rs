use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::core::request::MockRequest;
use crate::core::response::MockResponse;
use crate::error::MockError;
use crate::middleware::{Middleware, MiddlewareHandler};

/// Holds every request for a fixed time before answering
pub struct DelayMiddleware {
    delay: Duration,
}

impl DelayMiddleware {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Middleware for DelayMiddleware {
    async fn process_request(
        &self,
        request: MockRequest,
        next: Arc<dyn MiddlewareHandler>,
    ) -> Result<MockResponse, MockError> {
        if !self.delay.is_zero() {
            let start = Instant::now();
            tokio::time::sleep(self.delay).await;
            tracing::debug!(
                request_id = %request.request_id,
                "Response delayed by {}ms",
                start.elapsed().as_millis()
            );
        }

        next.handle(request).await
    }

    fn name(&self) -> &str {
        "delay"
    }
}
