// API Mock Library

pub mod config;
pub mod core;
pub mod error;
pub mod middleware;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use crate::config::{ConfigManager, EnvConfigManager, MockConfig};
pub use crate::error::{AuthError, ConfigError, MockError};
pub use crate::models::{ErrorResponse, ItemResult, ResponseProfile, SuccessRatio};
pub use crate::core::{
    counter::RequestCounter,
    decider::{decide, Outcome},
    request::MockRequest,
    responder::MockResponder,
    response::MockResponse,
    router::Router,
    service::{MockService, Service},
};
pub use crate::middleware::{Middleware, MiddlewareHandler};
