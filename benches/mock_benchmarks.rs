use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use api_mock::config::{MockConfig, MockMethod};
use api_mock::core::counter::RequestCounter;
use api_mock::core::decider::decide;
use api_mock::core::request::MockRequest;
use api_mock::core::responder::MockResponder;
use api_mock::core::service::MockService;
use api_mock::models::SuccessRatio;

use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri};
use serde_json::{json, Value};
use tokio::runtime::Runtime;

fn batch_body(items: usize) -> Bytes {
    let batch: Vec<Value> = (0..items)
        .map(|i| json!({"method": "GET", "relative_url": format!("/item/{}", i), "body": null}))
        .collect();
    let encoded = serde_urlencoded::to_string(&[("batch", Value::Array(batch).to_string())]).unwrap();
    Bytes::from(encoded)
}

fn bench_decider(c: &mut Criterion) {
    let mut group = c.benchmark_group("decider");

    for ratio in [1.0, 0.5, 0.9].iter() {
        let ratio = SuccessRatio::new(*ratio).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(ratio.value()), &ratio, |b, ratio| {
            let mut counter = 0u64;
            b.iter(|| {
                counter += 1;
                black_box(decide(*ratio, black_box(counter)))
            });
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut config = MockConfig::default();
    config.mock.success_ratio = SuccessRatio::new(0.5).unwrap();
    let responder = MockResponder::new(&config.mock, Arc::new(RequestCounter::new()));

    let mut group = c.benchmark_group("batch");

    for items in [1usize, 10, 100].iter() {
        let body = batch_body(*items);
        group.throughput(Throughput::Elements(*items as u64));
        group.bench_with_input(BenchmarkId::from_parameter(items), &body, |b, body| {
            b.iter(|| black_box(responder.respond_batch(body).unwrap()));
        });
    }

    group.finish();
}

fn bench_single_request(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut config = MockConfig::default();
    config.mock.methods = vec![MockMethod::Get];
    config.mock.sub_routes = vec!["/users/{id}".to_string()];
    config.rate_limit.requests_per_second = u32::MAX;
    let service = MockService::new(Arc::new(config)).unwrap();

    let mut group = c.benchmark_group("single_request");

    group.bench_function("in_process", |b| {
        b.to_async(&rt).iter(|| {
            let service = service.clone();
            async move {
                let request = MockRequest::new(
                    Method::GET,
                    Uri::from_static("/v1/mock/users/42"),
                    HeaderMap::new(),
                    Bytes::new(),
                    None,
                );
                black_box(service.handle(request).await)
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_decider, bench_batch, bench_single_request);
criterion_main!(benches);
