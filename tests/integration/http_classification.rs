//! HTTP behavior tests against a local mock server
//!
//! Exercise the production fetcher end to end: token exchange, query
//! parameter construction, envelope peeling, and the transient/fatal split
//! of HTTP failures.

use retail_traffic_extractor::config::ExtractorConfig;
use retail_traffic_extractor::fetcher::{FetchError, ProdcoFetcher, RecordFetcher};
use retail_traffic_extractor::streams::{STORES_DATA, TRAFFIC_DATA};
use retail_traffic_extractor::{parse_timestamp, Granularity, Window};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn window() -> Window {
    Window::new(
        parse_timestamp("2023-01-01T00:00:00").unwrap(),
        parse_timestamp("2023-01-03T00:00:00").unwrap(),
    )
    .unwrap()
}

fn config_for(server: &MockServer) -> ExtractorConfig {
    ExtractorConfig::from_json(
        &json!({
            "username": "acme",
            "password": "hunter2",
            "start_date": "2023-01-01T00:00:00",
            "request_delay_ms": 0,
            "api_base_url": server.uri(),
            "auth_url": format!("{}/token", server.uri()),
        })
        .to_string(),
    )
    .unwrap()
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=acme"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-123", "expires_in": 3600})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_window_fetch_sends_range_and_granularity() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/TrafficData/Hourly"))
        .and(query_param("from", "2023-01-01T00:00:00"))
        .and(query_param("to", "2023-01-03T00:00:00"))
        .and(query_param("increment", "FIFTEEN_MINUTES"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Data": [
                {"DateTime": "2023-01-01T08:00:00", "StoreNo": 1, "Traffic": 12},
                {"DateTime": "2023-01-01T08:15:00", "StoreNo": 1, "Traffic": 9},
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ProdcoFetcher::new(&config_for(&server)).unwrap();
    let records = fetcher
        .fetch_window(&TRAFFIC_DATA, &window(), Granularity::FifteenMinutes)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("Traffic"), Some(&json!(12)));
}

#[tokio::test]
async fn test_token_is_acquired_once_and_reused() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-123", "expires_in": 3600})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Stores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Data": []})))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = ProdcoFetcher::new(&config_for(&server)).unwrap();
    fetcher.fetch_all(&STORES_DATA).await.unwrap();
    fetcher.fetch_all(&STORES_DATA).await.unwrap();
}

#[tokio::test]
async fn test_missing_data_key_yields_empty_batch() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/TrafficData/Hourly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": "OK"})))
        .mount(&server)
        .await;

    let fetcher = ProdcoFetcher::new(&config_for(&server)).unwrap();
    let records = fetcher
        .fetch_window(&TRAFFIC_DATA, &window(), Granularity::Hour)
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_429_is_transient() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/TrafficData/Hourly"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let fetcher = ProdcoFetcher::new(&config_for(&server)).unwrap();
    let err = fetcher
        .fetch_window(&TRAFFIC_DATA, &window(), Granularity::Hour)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::RateLimited));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_5xx_is_transient() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/TrafficData/Hourly"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = ProdcoFetcher::new(&config_for(&server)).unwrap();
    let err = fetcher
        .fetch_window(&TRAFFIC_DATA, &window(), Granularity::Hour)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Server { status: 500 }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_4xx_is_fatal() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/TrafficData/Hourly"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such endpoint"))
        .mount(&server)
        .await;

    let fetcher = ProdcoFetcher::new(&config_for(&server)).unwrap();
    let err = fetcher
        .fetch_window(&TRAFFIC_DATA, &window(), Granularity::Hour)
        .await
        .unwrap_err();
    match err {
        FetchError::Client { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("no such endpoint"));
        }
        other => panic!("expected client error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_envelope_is_fatal() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/TrafficData/Hourly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Data": "not an array"})))
        .mount(&server)
        .await;

    let fetcher = ProdcoFetcher::new(&config_for(&server)).unwrap();
    let err = fetcher
        .fetch_window(&TRAFFIC_DATA, &window(), Granularity::Hour)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Envelope(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_rejected_token_request_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let fetcher = ProdcoFetcher::new(&config_for(&server)).unwrap();
    let err = fetcher.fetch_all(&STORES_DATA).await.unwrap_err();
    assert!(matches!(err, FetchError::Auth(_)));
    assert!(!err.is_transient());
}
