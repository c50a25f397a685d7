use hyper::Method;
use regex::Regex;

use crate::config::MockSettings;
use crate::error::{ConfigError, MockError};

/// Prefix every mock route lives under
pub const MOCK_PREFIX: &str = "/v1/mock";

/// Batch route, relative to [`MOCK_PREFIX`]
pub const BATCH_ROUTE: &str = "/batch";

/// What a matched route answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// One mock response per HTTP call
    Single,
    /// One mock response per sub-request of a batch call
    Batch,
}

/// Route parameter extracted from path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParam {
    /// Parameter name
    pub name: String,

    /// Parameter value
    pub value: String,
}

/// Route match result
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Matched route configuration
    pub route: RouteConfig,

    /// Extracted path parameters
    pub params: Vec<RouteParam>,
}

/// Route configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    /// Full route path pattern, prefix included
    pub path: String,

    /// Methods the route answers to
    pub methods: Vec<Method>,

    /// Kind of responder behind the route
    pub kind: RouteKind,
}

impl RouteConfig {
    /// Single mock route for a sub-route pattern
    pub fn single(sub_route: &str, methods: Vec<Method>) -> Self {
        Self {
            path: format!("{}{}", MOCK_PREFIX, sub_route),
            methods,
            kind: RouteKind::Single,
        }
    }

    /// The batch route
    pub fn batch() -> Self {
        Self {
            path: format!("{}{}", MOCK_PREFIX, BATCH_ROUTE),
            methods: vec![Method::POST],
            kind: RouteKind::Batch,
        }
    }
}

/// Router trait for matching requests to routes
pub trait Router: Send + Sync {
    /// Find the route answering `method` on `path`
    fn find_route(&self, method: &Method, path: &str) -> Result<RouteMatch, MockError>;

    /// Get all routes
    fn routes(&self) -> Vec<RouteConfig>;
}

/// Path pattern for route matching
#[derive(Debug, Clone)]
struct PathPattern {
    /// Compiled regex for matching
    regex: Regex,

    /// Parameter names in order of appearance
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compile the pattern of a route. The root sub-route also answers on the
    /// bare prefix, so `/v1/mock` and `/v1/mock/` reach the same route.
    fn for_route(route: &RouteConfig) -> Result<Self, ConfigError> {
        let is_root = route.kind == RouteKind::Single
            && route.path.strip_prefix(MOCK_PREFIX) == Some("/");
        Self::compile(&route.path, is_root)
    }

    /// Segments are literals, `{name}`, `{name:regex}`, `:name`, or a `*`
    /// matching the rest of the path.
    fn compile(path: &str, optional_trailing_slash: bool) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRoute {
            pattern: path.to_string(),
            reason,
        };

        let mut param_names = Vec::new();
        let mut regex_pattern = "^".to_string();

        for (i, part) in path.split('/').enumerate() {
            if i > 0 {
                regex_pattern.push('/');
            }

            if part.is_empty() {
                continue;
            }

            if part == "*" {
                regex_pattern.push_str(".*");
            } else if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                let (name, constraint) = match inner.split_once(':') {
                    Some((name, constraint)) => (name, constraint),
                    None => (inner, "[^/]+"),
                };
                if name.is_empty() {
                    return Err(invalid("empty parameter name".to_string()));
                }
                param_names.push(name.to_string());
                regex_pattern.push_str(&format!("({})", constraint));
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("empty parameter name".to_string()));
                }
                param_names.push(name.to_string());
                regex_pattern.push_str("([^/]+)");
            } else {
                regex_pattern.push_str(&regex::escape(part));
            }
        }

        if optional_trailing_slash && regex_pattern.ends_with('/') {
            regex_pattern.push('?');
        }
        regex_pattern.push('$');

        let regex = Regex::new(&regex_pattern).map_err(|e| invalid(e.to_string()))?;
        if regex.captures_len() != param_names.len() + 1 {
            return Err(invalid("parameter constraints cannot contain groups".to_string()));
        }

        Ok(Self { regex, param_names })
    }

    /// Check if this pattern matches the given path and extract parameters
    fn matches(&self, path: &str) -> Option<Vec<RouteParam>> {
        let captures = self.regex.captures(path)?;

        let params = self
            .param_names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                captures.get(i + 1).map(|value| RouteParam {
                    name: name.clone(),
                    value: value.as_str().to_string(),
                })
            })
            .collect();

        Some(params)
    }
}

/// Static route table built once at startup
#[derive(Debug, Clone, Default)]
pub struct BasicRouter {
    routes: Vec<(RouteConfig, PathPattern)>,
}

impl BasicRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every configured sub-route for every configured method,
    /// followed by the batch route
    pub fn from_settings(settings: &MockSettings) -> Result<Self, ConfigError> {
        let methods: Vec<Method> = settings.methods.iter().map(|m| m.as_method()).collect();
        let mut router = Self::new();

        if !methods.is_empty() {
            for sub_route in &settings.sub_routes {
                router.add_route(RouteConfig::single(sub_route, methods.clone()))?;
            }
        }
        router.add_route(RouteConfig::batch())?;

        Ok(router)
    }

    /// Add a route. Adding the same path and kind twice merges the methods.
    pub fn add_route(&mut self, route: RouteConfig) -> Result<(), ConfigError> {
        if let Some((existing, _)) = self
            .routes
            .iter_mut()
            .find(|(r, _)| r.path == route.path && r.kind == route.kind)
        {
            for method in route.methods {
                if !existing.methods.contains(&method) {
                    existing.methods.push(method);
                }
            }
            return Ok(());
        }

        let pattern = PathPattern::for_route(&route)?;
        self.routes.push((route, pattern));

        // The batch route shadows a sub-route registered on the same path and method
        self.routes.sort_by_key(|(r, _)| match r.kind {
            RouteKind::Batch => 0,
            RouteKind::Single => 1,
        });

        Ok(())
    }
}

impl Router for BasicRouter {
    fn find_route(&self, method: &Method, path: &str) -> Result<RouteMatch, MockError> {
        let mut path_matched = false;

        for (route, pattern) in &self.routes {
            if let Some(params) = pattern.matches(path) {
                if route.methods.contains(method) {
                    return Ok(RouteMatch {
                        route: route.clone(),
                        params,
                    });
                }
                path_matched = true;
            }
        }

        if path_matched {
            Err(MockError::MethodNotAllowed(format!("{} {}", method, path)))
        } else {
            Err(MockError::RouteNotFound(format!(
                "No route found for {} {}",
                method, path
            )))
        }
    }

    fn routes(&self) -> Vec<RouteConfig> {
        self.routes.iter().map(|(r, _)| r.clone()).collect()
    }
}
