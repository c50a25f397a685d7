use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::RateLimitConfig;
use crate::core::request::MockRequest;
use crate::core::response::MockResponse;
use crate::error::MockError;
use crate::middleware::{Middleware, MiddlewareHandler};

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct WindowState {
    /// Start of the current window
    started: Instant,

    /// Requests admitted in the current window
    current: u64,

    /// Requests admitted in the previous window
    previous: u64,
}

/// Global sliding-window request counter. The previous window's count is
/// weighted by how much of it still overlaps the last second.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u64,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            limit: u64::from(requests_per_second),
            state: Mutex::new(WindowState {
                started: Instant::now(),
                current: 0,
                previous: 0,
            }),
        }
    }

    /// Requests admitted per second
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Try to admit one request now
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Try to admit one request at the given instant
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let elapsed = now.saturating_duration_since(state.started);
        if elapsed >= WINDOW * 2 {
            state.previous = 0;
            state.current = 0;
            state.started = now;
        } else if elapsed >= WINDOW {
            state.previous = state.current;
            state.current = 0;
            state.started += WINDOW;
        }

        let into_window = now.saturating_duration_since(state.started).as_secs_f64();
        let overlap = 1.0 - (into_window / WINDOW.as_secs_f64()).min(1.0);
        let estimated = state.previous as f64 * overlap + state.current as f64;

        if estimated + 1.0 > self.limit as f64 {
            return false;
        }

        state.current += 1;
        true
    }
}

/// Rejects requests above the configured global rate. Rejected requests never
/// reach the counter.
pub struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(Arc::new(RateLimiter::new(config.requests_per_second)))
    }
}

#[async_trait]
impl Middleware for RateLimitMiddleware {
    async fn process_request(
        &self,
        request: MockRequest,
        next: Arc<dyn MiddlewareHandler>,
    ) -> Result<MockResponse, MockError> {
        if !self.limiter.try_acquire() {
            tracing::warn!(
                request_id = %request.request_id,
                limit = self.limiter.limit(),
                "Rate limit exceeded for {} {}",
                request.method,
                request.uri.path()
            );
            return Err(MockError::RateLimitExceeded);
        }

        next.handle(request).await
    }

    fn name(&self) -> &str {
        "rate_limit"
    }
}
