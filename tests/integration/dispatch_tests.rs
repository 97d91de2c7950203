//! Request dispatch tests: signing, cache deliveries, error mapping.

use eta::{ApiRequest, CacheConfig, Client, ErrorKind, Method, Params};
use futures::StreamExt;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{API_KEY, API_SECRET, TOKEN, TestServer, signature};

fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_request_is_signed() {
    let server = TestServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/catalogs"))
        .and(query_param("limit", "24"))
        .and(header("X-Token", TOKEN))
        .and(header("X-Signature", signature(TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "c1" }])))
        .expect(1)
        .mount(&server.server)
        .await;

    let client = server.client();
    let response = client
        .api("/v2/catalogs", Method::Get, params(json!({ "limit": 24 })))
        .live()
        .await
        .unwrap();

    assert_eq!(response.payload, json!([{ "id": "c1" }]));
}

#[tokio::test]
async fn test_cached_response_precedes_live() {
    let server = TestServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "o1" }])))
        .up_to_n_times(1)
        .mount(&server.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "o2" }])))
        .mount(&server.server)
        .await;

    let client = server.client();

    let first = client.api_cached("/v2/offers", Method::Get, Params::new()).collect_all().await;
    assert_eq!(first.len(), 1);

    let mut second = client.api_cached("/v2/offers", Method::Get, Params::new());
    let cached = second.next().await.unwrap().unwrap();
    let live = second.next().await.unwrap().unwrap();
    assert!(second.next().await.is_none());

    assert!(cached.from_cache);
    assert_eq!(cached.payload, json!([{ "id": "o1" }]));
    assert!(!live.from_cache);
    assert_eq!(live.payload, json!([{ "id": "o2" }]));
}

#[tokio::test]
async fn test_cache_not_consulted_without_use_cache() {
    let server = TestServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/stores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server.server)
        .await;

    let client = server.client();
    client.api("/v2/stores", Method::Get, Params::new()).live().await.unwrap();

    let deliveries = client.api("/v2/stores", Method::Get, Params::new()).collect_all().await;
    assert_eq!(deliveries.len(), 1);
}

#[tokio::test]
async fn test_mutating_request_never_served_from_cache() {
    let server = TestServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/offers"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "o9" })))
        .expect(2)
        .mount(&server.server)
        .await;

    let client = server.client();
    let request = ApiRequest::builder()
        .path("/v2/offers")
        .method(Method::Post)
        .params(params(json!({ "heading": "Milk" })))
        .use_cache(true)
        .build();

    client.request(request.clone()).live().await.unwrap();
    let deliveries = client.request(request).collect_all().await;

    assert_eq!(deliveries.len(), 1);
}

#[tokio::test]
async fn test_live_failure_follows_cached_response() {
    let server = TestServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/catalogs/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c1" })))
        .up_to_n_times(1)
        .mount(&server.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/catalogs/c1"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "id": "req-9",
            "code": 2000,
            "message": "Maintenance",
            "details": "",
        })))
        .mount(&server.server)
        .await;

    let client = server.client();
    client.api_cached("/v2/catalogs/c1", Method::Get, Params::new()).live().await.unwrap();

    let deliveries = client
        .api_cached("/v2/catalogs/c1", Method::Get, Params::new())
        .collect_all()
        .await;

    assert_eq!(deliveries.len(), 2);
    assert!(deliveries[0].as_ref().unwrap().from_cache);
    let err = deliveries[1].as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert_eq!(err.request_id(), Some("req-9"));
}

#[tokio::test]
async fn test_api_error_maps_to_kind() {
    let server = TestServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/users/1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "id": "req-5",
            "code": 1400,
            "message": "Access denied",
            "details": "requires api.users.1.read",
        })))
        .mount(&server.server)
        .await;

    let client = server.client();
    let err = client.api("/v2/users/1", Method::Get, Params::new()).live().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(err.api_code(), Some(1400));
    assert!(err.message().contains("requires api.users.1.read"));
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_disabled_cache_yields_single_delivery() {
    let server = TestServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/dealers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server.server)
        .await;

    let client = Client::builder()
        .credentials((API_KEY, API_SECRET))
        .base_url(server.server.uri())
        .insecure()
        .cache_config(CacheConfig::disabled())
        .build()
        .unwrap();

    for _ in 0..2 {
        let deliveries = client.api_cached("/v2/dealers", Method::Get, Params::new()).collect_all().await;
        assert_eq!(deliveries.len(), 1);
    }
}

#[test]
fn test_plain_http_requires_insecure() {
    let err = Client::builder()
        .credentials((API_KEY, API_SECRET))
        .base_url("http://localhost:1234")
        .build()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_missing_secret_is_configuration_error() {
    let err = Client::new((API_KEY, "")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    let client = Client::builder()
        .credentials((API_KEY, API_SECRET))
        .base_url("http://127.0.0.1:9")
        .insecure()
        .build()
        .unwrap();

    let err = client.connect().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.is_retriable());
}
