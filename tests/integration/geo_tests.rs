//! Geolocation enrichment tests.

use eta::{Location, Method, Params};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, Request, ResponseTemplate};

use crate::common::TestServer;

fn has_param(request: &Request, name: &str) -> bool {
    request.url.query_pairs().any(|(key, _)| key == name)
}

#[tokio::test]
async fn test_location_is_sent_with_every_request() -> anyhow::Result<()> {
    let server = TestServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/offers"))
        .and(query_param("r_lat", "55.6761"))
        .and(query_param("r_lng", "12.5683"))
        .and(query_param("r_sensor", "true"))
        .and(query_param("r_radius", "5000"))
        .and(query_param("query", "milk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server.server)
        .await;

    let client = server.client();
    client.set_location(55.6761, 12.5683, 4_200.0, true);

    let mut params = Params::new();
    params.insert("query".into(), json!("milk"));
    let response = client.api("/v2/offers", Method::Get, params).live().await?;
    assert!(!response.from_cache);
    Ok(())
}

#[tokio::test]
async fn test_no_geolocation_without_location() {
    let server = TestServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/stores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server.server)
        .await;

    let client = server.client();
    client.set_distance(Some(20_000.0));

    let mut params = Params::new();
    params.insert("r_radius".into(), json!(1000));
    client.api("/v2/stores", Method::Get, params).live().await.unwrap();

    let requests = server.server.received_requests().await.unwrap_or_default();
    let request = requests
        .iter()
        .find(|r| r.url.path() == "/v2/stores")
        .unwrap();
    for name in ["r_lat", "r_lng", "r_sensor", "r_radius"] {
        assert!(!has_param(request, name), "unexpected {name}");
    }
}

#[tokio::test]
async fn test_location_change_applies_to_later_requests() -> anyhow::Result<()> {
    let server = TestServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/dealers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server.server)
        .await;

    let client = server.client();
    client.set_location(55.0, 12.0, 1_000.0, false);
    client.api("/v2/dealers", Method::Get, Params::new()).live().await?;

    client.set_coordinates(Some(Location::new(56.0, 10.0)));
    client.set_distance(None);
    client.api("/v2/dealers", Method::Get, Params::new()).live().await?;

    let requests = server.server.received_requests().await.unwrap_or_default();
    let dealers: Vec<_> = requests.iter().filter(|r| r.url.path() == "/v2/dealers").collect();
    assert_eq!(dealers.len(), 2);

    assert!(has_param(dealers[0], "r_radius"));
    assert!(dealers[1].url.query_pairs().any(|(k, v)| k == "r_lat" && v == "56.0"));
    assert!(!has_param(dealers[1], "r_radius"));
    Ok(())
}
