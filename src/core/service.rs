use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::error_handling::HandleErrorLayer;
use axum::extract::ConnectInfo;
use axum::BoxError;
use futures::future::BoxFuture;
use hyper::header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use hyper::{Body, HeaderMap, Method, Request, Response, StatusCode};
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{MockConfig, MockMethod};
use crate::core::counter::RequestCounter;
use crate::core::request::MockRequest;
use crate::core::responder::MockResponder;
use crate::core::response::MockResponse;
use crate::core::router::{BasicRouter, RouteKind, Router};
use crate::error::{AuthError, MockError};
use crate::middleware::auth::{AuthMiddleware, AUTHENTICATE_HEADER};
use crate::middleware::counter::CounterMiddleware;
use crate::middleware::delay::DelayMiddleware;
use crate::middleware::logging::LoggingMiddleware;
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::middleware::{FinalHandler, Middleware, MiddlewareChain, MiddlewareHandler};
use crate::models::ErrorResponse;
use crate::utils::generate_trace_id;

/// Paths answered with a bare 200 before any routing happens
const HEARTBEAT_PATHS: [&str; 2] = ["/live", "/ready"];

/// Core mock service trait
#[async_trait]
pub trait Service: Send + Sync {
    /// Process an incoming request and return a response
    async fn process_request(&self, request: MockRequest) -> Result<MockResponse, MockError>;

    /// Bind the listener and start serving in the background
    async fn start(&self) -> Result<(), MockError>;

    /// Stop the server and wait for in-flight requests
    async fn stop(&self) -> Result<(), MockError>;

    /// Check if the service is healthy
    async fn health_check(&self) -> bool;
}

/// Server state that can be mutated
#[derive(Default)]
struct ServerState {
    /// Server handle for graceful shutdown
    server_handle: Option<tokio::task::JoinHandle<()>>,
    /// Shutdown signal sender
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    /// Address the listener is bound to
    local_addr: Option<SocketAddr>,
}

/// The HTTP mock service
#[derive(Clone)]
pub struct MockService {
    /// Service configuration
    config: Arc<MockConfig>,
    /// Static route table
    router: Arc<BasicRouter>,
    /// Counter shared by every route
    counter: Arc<RequestCounter>,
    /// Middleware chain in front of single routes
    single_chain: Arc<dyn MiddlewareHandler>,
    /// Middleware chain in front of the batch route
    batch_chain: Arc<dyn MiddlewareHandler>,
    /// Server state (handle and shutdown sender)
    server_state: Arc<tokio::sync::Mutex<ServerState>>,
}

impl MockService {
    /// Create a service with a counter starting at 0
    pub fn new(config: Arc<MockConfig>) -> Result<Self, MockError> {
        Self::with_counter(config, Arc::new(RequestCounter::new()))
    }

    /// Create a service around an existing counter
    pub fn with_counter(
        config: Arc<MockConfig>,
        counter: Arc<RequestCounter>,
    ) -> Result<Self, MockError> {
        let router = BasicRouter::from_settings(&config.mock)?;
        for route in router.routes() {
            tracing::debug!("Registered route: {:?} {}", route.methods, route.path);
        }

        let responder = Arc::new(MockResponder::new(&config.mock, counter.clone()));
        let (single_chain, batch_chain) = build_chains(&config, &counter, &responder);

        Ok(Self {
            config,
            router: Arc::new(router),
            counter,
            single_chain,
            batch_chain,
            server_state: Arc::new(tokio::sync::Mutex::new(ServerState::default())),
        })
    }

    /// Counter shared by every route
    pub fn counter(&self) -> &Arc<RequestCounter> {
        &self.counter
    }

    /// Address the server is listening on, once started
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.server_state.lock().await.local_addr
    }

    /// Process a request and render errors the way clients see them
    pub async fn handle(&self, request: MockRequest) -> MockResponse {
        let summary = request.clone();
        match self.process_request(request).await {
            Ok(response) => response,
            Err(err) => self.error_response(&summary, &err),
        }
    }

    /// Render an error as an HTTP response
    pub fn error_response(&self, request: &MockRequest, err: &MockError) -> MockResponse {
        match err {
            MockError::AuthError(kind) => {
                let response = MockResponse::empty(StatusCode::UNAUTHORIZED);
                if *kind == AuthError::InvalidToken {
                    response.with_header(WWW_AUTHENTICATE, HeaderValue::from_static(AUTHENTICATE_HEADER))
                } else {
                    response
                }
            }
            MockError::RateLimitExceeded if self.config.rate_limit.exceeded_body.is_some() => {
                tracing::warn!("{}: {}", request.describe(), err);
                let body = &self.config.rate_limit.exceeded_body;
                MockResponse::json(StatusCode::TOO_MANY_REQUESTS, body)
                    .unwrap_or_else(|_| MockResponse::empty(StatusCode::TOO_MANY_REQUESTS))
            }
            _ => {
                let status = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let trace_id = generate_trace_id();

                if status.is_server_error() {
                    tracing::error!(trace_id = %trace_id, "[{}] {}: {}", trace_id, request.describe(), err);
                } else {
                    tracing::warn!(trace_id = %trace_id, "[{}] {}: {}", trace_id, request.describe(), err);
                }

                let envelope = ErrorResponse::new(err.public_message(), err.error_code(), trace_id);
                MockResponse::json(status, &envelope).unwrap_or_else(|_| MockResponse::empty(status))
            }
        }
    }

    /// Adapt a hyper request to the mock service
    async fn serve_http(&self, remote: SocketAddr, req: Request<Body>) -> Response<Body> {
        let (parts, body) = req.into_parts();

        let client_ip = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse().ok())
            .or(Some(remote.ip()));

        let limit = self.config.server.max_body_size;
        let body_result = hyper::body::to_bytes(http_body::Limited::new(body, limit)).await;
        let request = MockRequest::new(
            parts.method,
            parts.uri,
            parts.headers,
            body_result.as_ref().cloned().unwrap_or_default(),
            client_ip,
        )
        .with_version(parts.version);

        let response = match body_result {
            Ok(_) => self.handle(request).await,
            Err(e) => {
                let err = if e.downcast_ref::<http_body::LengthLimitError>().is_some() {
                    MockError::BodyTooLarge(limit)
                } else {
                    MockError::InvalidBody(format!("failed to read request body: {}", e))
                };
                self.error_response(&request, &err)
            }
        };

        response.into_http()
    }
}

/// Render errors raised by the tower layers in front of the service. A
/// request running past the timeout answers 504.
async fn handle_layer_error(err: BoxError) -> Response<Body> {
    let status = if err.is::<Elapsed>() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    tracing::warn!("Request aborted with {}: {}", status, err);
    MockResponse::empty(status).into_http()
}

/// Answer heartbeat checks
fn heartbeat(request: &MockRequest) -> Option<MockResponse> {
    if request.method != Method::GET && request.method != Method::HEAD {
        return None;
    }
    if !HEARTBEAT_PATHS
        .iter()
        .any(|path| request.uri.path().eq_ignore_ascii_case(path))
    {
        return None;
    }

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    Some(MockResponse::new(StatusCode::OK, headers, bytes::Bytes::from_static(b".")))
}

/// Build the single and batch middleware chains. Both share the logging,
/// auth, rate limit and delay middlewares; only single routes are counted
/// per HTTP call.
fn build_chains(
    config: &MockConfig,
    counter: &Arc<RequestCounter>,
    responder: &Arc<MockResponder>,
) -> (Arc<dyn MiddlewareHandler>, Arc<dyn MiddlewareHandler>) {
    let logging: Arc<dyn Middleware> = Arc::new(LoggingMiddleware::new());
    let auth: Option<Arc<dyn Middleware>> =
        AuthMiddleware::from_config(&config.auth).map(|m| Arc::new(m) as Arc<dyn Middleware>);
    let rate_limit: Arc<dyn Middleware> = Arc::new(RateLimitMiddleware::from_config(&config.rate_limit));
    let delay: Arc<dyn Middleware> = Arc::new(DelayMiddleware::new(config.mock.response_delay));

    let mut single = MiddlewareChain::new();
    let mut batch = MiddlewareChain::new();
    for chain in [&mut single, &mut batch] {
        chain.add_shared(logging.clone());
        if let Some(auth) = &auth {
            chain.add_shared(auth.clone());
        }
        chain.add_shared(rate_limit.clone());
    }
    single.add(CounterMiddleware::new(counter.clone()));
    single.add_shared(delay.clone());
    batch.add_shared(delay);

    tracing::debug!("Single route middlewares: {:?}", single.names());
    tracing::debug!("Batch route middlewares: {:?}", batch.names());

    let single_responder = responder.clone();
    let single_handler = FinalHandler::new(move |request: MockRequest| {
        let responder = single_responder.clone();
        Box::pin(async move {
            let sequence = request.sequence.ok_or_else(|| {
                MockError::InternalError("request reached the responder uncounted".to_string())
            })?;
            let reply = responder.respond(sequence);
            tracing::debug!(sequence, outcome = ?reply.outcome, "Mock reply {}", reply.status);
            MockResponse::json(reply.status, &reply.body)
        }) as BoxFuture<'static, Result<MockResponse, MockError>>
    });

    let batch_responder = responder.clone();
    let batch_handler = FinalHandler::new(move |request: MockRequest| {
        let responder = batch_responder.clone();
        Box::pin(async move {
            let results = responder.respond_batch(&request.body)?;
            MockResponse::json(StatusCode::OK, &results)
        }) as BoxFuture<'static, Result<MockResponse, MockError>>
    });

    (
        single.build(Arc::new(single_handler)),
        batch.build(Arc::new(batch_handler)),
    )
}

/// CORS policy: any origin, mirrored so credentials can be allowed
fn cors_layer(methods: &[MockMethod]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods(methods.iter().map(MockMethod::as_method).collect::<Vec<_>>())
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([HeaderName::from_static("link")])
        .max_age(Duration::from_secs(300))
}

#[async_trait]
impl Service for MockService {
    async fn process_request(&self, request: MockRequest) -> Result<MockResponse, MockError> {
        if let Some(response) = heartbeat(&request) {
            return Ok(response);
        }

        let route_match = self.router.find_route(&request.method, request.uri.path())?;

        tracing::debug!(
            "Route matched: {} {} -> {}",
            request.method,
            request.uri.path(),
            route_match.route.path
        );
        if !route_match.params.is_empty() {
            let params = route_match
                .params
                .iter()
                .map(|p| format!("{}={}", p.name, p.value))
                .collect::<Vec<_>>()
                .join(", ");
            tracing::debug!("Route parameters: {}", params);
        }

        match route_match.route.kind {
            RouteKind::Single => self.single_chain.handle(request).await,
            RouteKind::Batch => self.batch_chain.handle(request).await,
        }
    }

    async fn start(&self) -> Result<(), MockError> {
        let mut server_state = self.server_state.lock().await;
        if server_state.server_handle.is_some() {
            return Err(MockError::InternalError(
                "Server is already running".to_string(),
            ));
        }

        let service = self.clone();
        let app = axum::Router::new()
            .fallback(
                move |ConnectInfo(remote): ConnectInfo<SocketAddr>, req: Request<Body>| {
                    let service = service.clone();
                    async move { service.serve_http(remote, req).await }
                },
            )
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors_layer(&self.config.mock.methods))
                    .layer(CatchPanicLayer::new())
                    .layer(HandleErrorLayer::new(handle_layer_error))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        self.config.server.request_timeout,
                    ))),
            );

        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| MockError::InternalError(format!("Invalid address: {}", e)))?;

        let server = axum::Server::try_bind(&addr)
            .map_err(|e| MockError::InternalError(format!("Failed to bind {}: {}", addr, e)))?
            .serve(app.into_make_service_with_connect_info::<SocketAddr>());
        let local_addr = server.local_addr();

        tracing::info!("service listening on {}", local_addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let server_handle = tokio::spawn(async move {
            let graceful = server.with_graceful_shutdown(async {
                shutdown_rx.await.ok();
                tracing::info!("Shutdown signal received, starting graceful shutdown");
            });

            if let Err(e) = graceful.await {
                tracing::error!("Server error: {}", e);
            }

            tracing::info!("Server on {} has been shut down", local_addr);
        });

        server_state.server_handle = Some(server_handle);
        server_state.shutdown_tx = Some(shutdown_tx);
        server_state.local_addr = Some(local_addr);

        Ok(())
    }

    async fn stop(&self) -> Result<(), MockError> {
        let mut server_state = self.server_state.lock().await;

        let handle = server_state.server_handle.take().ok_or_else(|| {
            MockError::InternalError("Server is not running".to_string())
        })?;

        if let Some(tx) = server_state.shutdown_tx.take() {
            // The server may already be gone
            let _ = tx.send(());
        }
        server_state.local_addr = None;

        handle.await.map_err(|e| {
            tracing::error!("Error while shutting down server: {}", e);
            MockError::InternalError(format!("Error while shutting down server: {}", e))
        })?;

        tracing::info!("Server has been shut down gracefully");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let server_state = self.server_state.lock().await;
        server_state
            .server_handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}
