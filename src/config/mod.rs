use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use hyper::{Method, StatusCode};
use serde_json::Value;

use crate::error::ConfigError;
use crate::models::{ResponseProfile, SuccessRatio};
use crate::utils::split_list;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RATE_LIMIT: u32 = 1000;
const MAX_RESPONSE_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            request_timeout: 30,
            max_body_size: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Authentication configuration. At most one credential is set.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Expected value of the `X-API-KEY` header
    pub api_key: Option<String>,

    /// Expected bearer token in the `Authorization` header
    pub api_token: Option<String>,
}

/// HTTP methods a sub-route can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl MockMethod {
    pub const ALL: [MockMethod; 5] = [
        MockMethod::Get,
        MockMethod::Post,
        MockMethod::Put,
        MockMethod::Delete,
        MockMethod::Patch,
    ];

    pub fn as_method(&self) -> Method {
        match self {
            MockMethod::Get => Method::GET,
            MockMethod::Post => Method::POST,
            MockMethod::Put => Method::PUT,
            MockMethod::Delete => Method::DELETE,
            MockMethod::Patch => Method::PATCH,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MockMethod::Get => "GET",
            MockMethod::Post => "POST",
            MockMethod::Put => "PUT",
            MockMethod::Delete => "DELETE",
            MockMethod::Patch => "PATCH",
        }
    }
}

impl FromStr for MockMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MockMethod::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| ConfigError::MethodNotAllowed(s.to_string()))
    }
}

impl fmt::Display for MockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mock behavior configuration
#[derive(Debug, Clone)]
pub struct MockSettings {
    /// Methods every sub-route answers to
    pub methods: Vec<MockMethod>,

    /// Sub-routes under the mock prefix
    pub sub_routes: Vec<String>,

    /// Reply for successful requests
    pub success: ResponseProfile,

    /// Reply for failed requests
    pub failure: ResponseProfile,

    /// Ratio of successful requests
    pub success_ratio: SuccessRatio,

    /// Fixed delay applied before answering
    pub response_delay: Duration,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            methods: Vec::new(),
            sub_routes: Vec::new(),
            success: ResponseProfile::new(
                StatusCode::OK,
                Some(serde_json::json!({"success": true})),
            ),
            failure: ResponseProfile::new(StatusCode::BAD_REQUEST, None),
            success_ratio: SuccessRatio::ALWAYS,
            response_delay: Duration::ZERO,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per second
    pub requests_per_second: u32,

    /// Body returned with 429 responses. `None` means a generated error envelope.
    pub exceeded_body: Option<Value>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_RATE_LIMIT,
            exceeded_body: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Human readable output instead of JSON lines
    pub pretty: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            pretty: false,
        }
    }
}

/// Main service configuration
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Mock behavior
    pub mock: MockSettings,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl MockConfig {
    /// Load the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from an arbitrary variable source. Empty values
    /// are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = MockConfig::default();

        config.auth.api_key = get("API_KEY");
        config.auth.api_token = get("API_TOKEN");
        if config.auth.api_key.is_some() && config.auth.api_token.is_some() {
            return Err(ConfigError::ConflictingCredentials);
        }

        if let Some(port) = get("PORT") {
            config.server.port = parse_int("PORT", &port)?;
        }

        if let Some(delay) = get("RESP_DELAY") {
            let millis: u64 = parse_int("RESP_DELAY", &delay)?;
            let delay = Duration::from_millis(millis);
            if delay > MAX_RESPONSE_DELAY {
                return Err(ConfigError::InvalidValue {
                    var: "RESP_DELAY",
                    reason: "cannot be greater than 30 seconds".to_string(),
                });
            }
            config.mock.response_delay = delay;
        }

        if let Some(code) = get("FAILURE_RESP_CODE") {
            config.mock.failure.status = parse_status("FAILURE_RESP_CODE", &code)?;
        }
        if let Some(body) = get("FAILURE_RESP_BODY") {
            config.mock.failure.body = Some(parse_json("FAILURE_RESP_BODY", &body)?);
        }

        if let Some(code) = get("SUCCESS_RESP_CODE") {
            config.mock.success.status = parse_status("SUCCESS_RESP_CODE", &code)?;
        }
        if let Some(body) = get("SUCCESS_RESP_BODY") {
            config.mock.success.body = Some(parse_json("SUCCESS_RESP_BODY", &body)?);
        }

        if let Some(ratio) = get("SUCCESS_RATIO") {
            let ratio: f64 = ratio.trim().parse().map_err(|e: std::num::ParseFloatError| {
                ConfigError::InvalidValue {
                    var: "SUCCESS_RATIO",
                    reason: e.to_string(),
                }
            })?;
            config.mock.success_ratio = SuccessRatio::new(ratio)?;
        }

        if let Some(limit) = get("RATE_LIMIT") {
            let limit: u32 = parse_int("RATE_LIMIT", &limit)?;
            if limit == 0 {
                return Err(ConfigError::InvalidValue {
                    var: "RATE_LIMIT",
                    reason: "must be at least 1 request per second".to_string(),
                });
            }
            config.rate_limit.requests_per_second = limit;
        }
        if let Some(body) = get("RATE_EXCEEDED_RESP_BODY") {
            config.rate_limit.exceeded_body = Some(parse_json("RATE_EXCEEDED_RESP_BODY", &body)?);
        }

        if let Some(methods) = get("METHODS") {
            let mut seen = HashSet::new();
            for method in split_list(&methods) {
                let method: MockMethod = method.parse()?;
                if seen.insert(method) {
                    config.mock.methods.push(method);
                }
            }
        }

        if let Some(routes) = get("SUB_ROUTES") {
            let routes = split_list(&routes);
            if let Some(bad) = routes.iter().find(|r| !r.starts_with('/')) {
                return Err(ConfigError::InvalidRoute {
                    pattern: bad.clone(),
                    reason: "sub-routes must start with '/'".to_string(),
                });
            }
            config.mock.sub_routes = routes;
        }

        if let Some(level) = get("LOG_LEVEL") {
            config.logging.level = level.to_lowercase();
        }
        if let Some(pretty) = get("PRETTYLOG") {
            config.logging.pretty = pretty.parse().map_err(|e: std::str::ParseBoolError| {
                ConfigError::InvalidFormat {
                    var: "PRETTYLOG",
                    format: "bool",
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(config)
    }

    /// Log the loaded configuration at debug level
    pub fn log_configuration(&self) {
        tracing::debug!("Mock svc configuration:");
        tracing::debug!(
            "API rate limit: {} requests per second",
            self.rate_limit.requests_per_second
        );
        tracing::debug!("Success ratio: {}", self.mock.success_ratio.value());
        tracing::debug!("Supported sub routes: {:?}", self.mock.sub_routes);
        tracing::debug!(
            "Supported methods: {:?}",
            self.mock.methods.iter().map(MockMethod::as_str).collect::<Vec<_>>()
        );
        tracing::debug!("Response delay: {}ms", self.mock.response_delay.as_millis());
        tracing::debug!(
            "Authentication: {}",
            match (&self.auth.api_key, &self.auth.api_token) {
                (Some(_), _) => "api key",
                (_, Some(_)) => "bearer token",
                _ => "disabled",
            }
        );
    }
}

fn parse_int<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidFormat {
        var,
        format: "int",
        reason: e.to_string(),
    })
}

fn parse_status(var: &'static str, value: &str) -> Result<StatusCode, ConfigError> {
    let code: u16 = parse_int(var, value)?;
    StatusCode::from_u16(code).map_err(|e| ConfigError::InvalidValue {
        var,
        reason: e.to_string(),
    })
}

fn parse_json(var: &'static str, value: &str) -> Result<Value, ConfigError> {
    serde_json::from_str(value).map_err(|e| ConfigError::InvalidFormat {
        var,
        format: "json",
        reason: e.to_string(),
    })
}

/// Configuration manager trait
pub trait ConfigManager: Send + Sync {
    /// Get the current configuration
    fn get_config(&self) -> Arc<MockConfig>;
}

/// Configuration manager backed by the process environment. The
/// configuration is read once and never changes afterwards.
pub struct EnvConfigManager {
    config: Arc<MockConfig>,
}

impl EnvConfigManager {
    /// Read and validate the environment
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            config: Arc::new(MockConfig::from_env()?),
        })
    }
}

impl ConfigManager for EnvConfigManager {
    fn get_config(&self) -> Arc<MockConfig> {
        self.config.clone()
    }
}
