use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{Instrument, Level};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::core::request::MockRequest;
use crate::core::response::MockResponse;
use crate::error::MockError;
use crate::middleware::{Middleware, MiddlewareHandler};

/// Headers whose values never end up in the logs
const HIDDEN_HEADERS: [&str; 2] = ["authorization", "x-api-key"];

/// Build the level filter. `RUST_LOG` wins over the configured level.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        "trace" | "debug" | "info" | "warn" | "error" => EnvFilter::new(level),
        _ => EnvFilter::new("info"),
    })
}

/// Initialize the tracing system: JSON lines by default, human readable
/// output when `pretty` is set
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter = env_filter(&config.level);

    if config.pretty {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_timer(ChronoUtc::rfc_3339())
            .pretty();
        Registry::default().with(env_filter).with(fmt_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .json();
        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!("Tracing system initialized (level: {})", config.level);
}

/// Logs every request entering the chain and how it completed
#[derive(Debug, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn process_request(
        &self,
        request: MockRequest,
        next: Arc<dyn MiddlewareHandler>,
    ) -> Result<MockResponse, MockError> {
        let request_span = tracing::span!(
            Level::INFO,
            "request",
            request_id = %request.request_id,
            method = %request.method,
            path = %request.uri.path(),
            client_ip = ?request.client_ip,
        );

        request_span.in_scope(|| {
            tracing::debug!("{}", request.describe());
            for (name, value) in request.headers.iter() {
                if HIDDEN_HEADERS.contains(&name.as_str()) {
                    tracing::trace!(header_name = %name, "Credential header present (value hidden)");
                } else {
                    tracing::trace!(header_name = %name, header_value = ?value, "Request header");
                }
            }
        });

        let start = Instant::now();
        let result = next.handle(request).instrument(request_span.clone()).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        request_span.in_scope(|| match &result {
            Ok(response) => {
                tracing::debug!(
                    status_code = response.status.as_u16(),
                    body_size = response.body.len(),
                    elapsed_ms,
                    "Response: {}",
                    response.status
                );
            }
            Err(error) => {
                tracing::debug!(
                    status_code = error.status_code(),
                    elapsed_ms,
                    "Request rejected: {}",
                    error
                );
            }
        });

        result
    }

    fn name(&self) -> &str {
        "logging"
    }
}
