use std::sync::Arc;

use api_mock::config::{MockConfig, MockMethod};
use api_mock::core::counter::RequestCounter;
use api_mock::core::request::MockRequest;
use api_mock::core::service::{MockService, Service};
use api_mock::models::{ItemResult, ResponseProfile, SuccessRatio};
use api_mock::MockError;

use bytes::Bytes;
use hyper::header::HeaderValue;
use hyper::{HeaderMap, Method, StatusCode, Uri};
use serde_json::{json, Value};

/// Ratio 0.5 with explicit success and failure bodies
fn alternating_config() -> MockConfig {
    let mut config = MockConfig::default();
    config.mock.methods = vec![MockMethod::Get, MockMethod::Post, MockMethod::Put];
    config.mock.sub_routes = vec!["/foo".to_string(), "/users/{id}".to_string()];
    config.mock.success = ResponseProfile::new(StatusCode::OK, Some(json!({"success": true})));
    config.mock.failure = ResponseProfile::new(StatusCode::BAD_REQUEST, Some(json!({"success": false})));
    config.mock.success_ratio = SuccessRatio::new(0.5).unwrap();
    config
}

fn service(config: MockConfig) -> MockService {
    MockService::new(Arc::new(config)).unwrap()
}

fn get(uri: &'static str) -> MockRequest {
    MockRequest::new(Method::GET, Uri::from_static(uri), HeaderMap::new(), Bytes::new(), None)
}

fn batch(items: &[Value]) -> MockRequest {
    let encoded =
        serde_urlencoded::to_string(&[("batch", Value::Array(items.to_vec()).to_string())]).unwrap();
    let mut headers = HeaderMap::new();
    headers.insert(
        "content-type",
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    MockRequest::new(
        Method::POST,
        Uri::from_static("/v1/mock/batch"),
        headers,
        Bytes::from(encoded),
        None,
    )
}

fn raw_batch(body: &'static str) -> MockRequest {
    MockRequest::new(
        Method::POST,
        Uri::from_static("/v1/mock/batch"),
        HeaderMap::new(),
        Bytes::from_static(body.as_bytes()),
        None,
    )
}

fn sub_request(url: &str) -> Value {
    json!({"method": "GET", "relative_url": url, "body": null})
}

#[tokio::test]
async fn test_three_sequential_single_requests() {
    let service = service(alternating_config());

    let mut replies = Vec::new();
    for _ in 0..3 {
        let response = service.handle(get("/v1/mock/foo")).await;
        replies.push((response.status, response.json_body::<Value>().unwrap()));
    }

    assert_eq!(
        replies,
        vec![
            (StatusCode::OK, json!({"success": true})),
            (StatusCode::BAD_REQUEST, json!({"success": false})),
            (StatusCode::OK, json!({"success": true})),
        ]
    );
    assert_eq!(service.counter().current(), 3);
}

#[tokio::test]
async fn test_batch_of_two() {
    let service = service(alternating_config());

    let response = service
        .handle(batch(&[sub_request("/a"), sub_request("/b")]))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers.get("content-type").unwrap(), "application/json");
    let results: Vec<ItemResult> = response.json_body().unwrap();
    assert_eq!(
        results,
        vec![
            ItemResult {
                code: 200,
                body: r#"{"success":true}"#.to_string()
            },
            ItemResult {
                code: 400,
                body: r#"{"success":false}"#.to_string()
            },
        ]
    );
    assert_eq!(service.counter().current(), 2);
}

#[tokio::test]
async fn test_batch_shares_cadence_with_single_routes() {
    let service = service(alternating_config());

    // Takes counter value 1
    assert_eq!(service.handle(get("/v1/mock/foo")).await.status, StatusCode::OK);

    let response = service
        .handle(batch(&[sub_request("/a"), sub_request("/b"), sub_request("/c")]))
        .await;
    let codes: Vec<u16> = response
        .json_body::<Vec<ItemResult>>()
        .unwrap()
        .into_iter()
        .map(|item| item.code)
        .collect();
    assert_eq!(codes, vec![400, 200, 400]);

    // Counter value 5 is odd, so the next single request succeeds
    assert_eq!(service.handle(get("/v1/mock/foo")).await.status, StatusCode::OK);
    assert_eq!(service.counter().current(), 5);
}

#[tokio::test]
async fn test_empty_batch() {
    let service = service(alternating_config());

    let response = service.handle(batch(&[])).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"[]"));
    assert_eq!(service.counter().current(), 0);
}

#[tokio::test]
async fn test_malformed_batch_bodies() {
    let service = service(alternating_config());

    for body in [
        "",
        "other=1",
        "batch=not-json",
        "batch=%7B%7D",
        "batch=%5B1%2C2%5D",
        "batch=%ZZ",
        "batch=%5B%5D;x=1",
    ] {
        let response = service.handle(raw_batch(body)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "body: {:?}", body);

        let envelope: Value = response.json_body().unwrap();
        assert_eq!(envelope["error"]["message"], "body parsing error");
        assert_eq!(envelope["error"]["code"], 1001);
    }

    assert_eq!(service.counter().current(), 0);
}

#[tokio::test]
async fn test_missing_failure_body_uses_error_envelope() {
    let mut config = alternating_config();
    config.mock.failure = ResponseProfile::new(StatusCode::SERVICE_UNAVAILABLE, None);
    let service = service(config);

    service.handle(get("/v1/mock/foo")).await;
    let failed = service.handle(get("/v1/mock/foo")).await;

    assert_eq!(failed.status, StatusCode::SERVICE_UNAVAILABLE);
    let envelope: Value = failed.json_body().unwrap();
    assert_eq!(envelope["error"]["message"], "failed request");
    assert_eq!(envelope["error"]["code"], 1005);
    let id = envelope["error"]["id"].as_str().unwrap();
    assert!(u64::from_str_radix(id, 16).is_ok());
}

#[tokio::test]
async fn test_route_parameters_and_errors() {
    let service = service(alternating_config());

    assert!(service.process_request(get("/v1/mock/users/42")).await.is_ok());
    assert!(matches!(
        service.process_request(get("/v1/mock/users")).await,
        Err(MockError::RouteNotFound(_))
    ));

    let delete = MockRequest::new(
        Method::DELETE,
        Uri::from_static("/v1/mock/foo"),
        HeaderMap::new(),
        Bytes::new(),
        None,
    );
    assert!(matches!(
        service.process_request(delete).await,
        Err(MockError::MethodNotAllowed(_))
    ));
}

#[tokio::test]
async fn test_api_key_authentication() {
    let mut config = alternating_config();
    config.auth.api_key = Some("s3cr3t".to_string());
    let service = service(config);

    let rejected = service.handle(get("/v1/mock/foo")).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert!(rejected.body.is_empty());
    assert!(rejected.headers.get("www-authenticate").is_none());

    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_static("s3cr3t"));
    let accepted = MockRequest::new(
        Method::GET,
        Uri::from_static("/v1/mock/foo"),
        headers,
        Bytes::new(),
        None,
    );
    assert_eq!(service.handle(accepted).await.status, StatusCode::OK);

    // Rejected requests are not counted
    assert_eq!(service.counter().current(), 1);
}

#[tokio::test]
async fn test_rate_limit_envelope_does_not_count() {
    let mut config = alternating_config();
    config.rate_limit.requests_per_second = 2;
    let service = service(config);

    assert_eq!(service.handle(get("/v1/mock/foo")).await.status, StatusCode::OK);
    assert_eq!(service.handle(get("/v1/mock/foo")).await.status, StatusCode::BAD_REQUEST);

    let limited = service.handle(get("/v1/mock/foo")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    let envelope: Value = limited.json_body().unwrap();
    assert_eq!(envelope["error"]["message"], "rate limit exceeded");
    assert_eq!(envelope["error"]["code"], 1004);

    let limited_batch = service.handle(batch(&[sub_request("/a")])).await;
    assert_eq!(limited_batch.status, StatusCode::TOO_MANY_REQUESTS);

    assert_eq!(service.counter().current(), 2);
}

#[tokio::test]
async fn test_no_methods_means_only_batch() {
    let mut config = alternating_config();
    config.mock.methods.clear();
    let service = service(config);

    let response = service.handle(get("/v1/mock/foo")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = service.handle(batch(&[sub_request("/a")])).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_single_requests_take_distinct_values() {
    let counter = Arc::new(RequestCounter::new());
    let mut config = alternating_config();
    config.mock.success_ratio = SuccessRatio::new(0.75).unwrap();
    let service = MockService::with_counter(Arc::new(config), counter.clone()).unwrap();

    let mut handles = Vec::new();
    for _ in 0..200 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.handle(get("/v1/mock/foo")).await.status
        }));
    }

    let mut failures = 0;
    for handle in handles {
        if handle.await.unwrap() == StatusCode::BAD_REQUEST {
            failures += 1;
        }
    }

    // Exactly one in four of 1..=200 is a multiple of 4
    assert_eq!(failures, 50);
    assert_eq!(counter.current(), 200);
}

#[tokio::test]
async fn test_root_sub_route_answers_with_and_without_slash() {
    let mut config = alternating_config();
    config.mock.sub_routes = vec!["/".to_string()];
    config.mock.success_ratio = SuccessRatio::ALWAYS;
    let service = service(config);

    for uri in ["/v1/mock", "/v1/mock/"] {
        let response = service.handle(get(uri)).await;
        assert_eq!(response.status, StatusCode::OK, "uri: {}", uri);
        assert_eq!(response.json_body::<Value>().unwrap(), json!({"success": true}));
    }
    assert_eq!(service.counter().current(), 2);
}
