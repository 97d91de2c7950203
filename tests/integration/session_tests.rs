//! Session lifecycle tests: creation, user attach/detach, expiry.

use std::time::Duration;

use eta::{ErrorKind, Method, Params, SessionEvent};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{EXPIRES, TOKEN, TestServer, session_body, signature, user_body};

async fn mount_attach(server: &TestServer) {
    Mock::given(method("PUT"))
        .and(path("/v2/sessions"))
        .and(header("X-Token", TOKEN))
        .and(header("X-Signature", signature(TOKEN).as_str()))
        .and(body_json(json!({ "email": "anne@example.com", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(TOKEN, Some(user_body()))))
        .named("attach user")
        .mount(&server.server)
        .await;
}

#[tokio::test]
async fn test_concurrent_requests_share_one_session() {
    let server = TestServer::start_with_session_delay(Duration::from_millis(200)).await;
    Mock::given(method("GET"))
        .and(path("/v2/catalogs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(5)
        .mount(&server.server)
        .await;

    let client = server.client();
    let streams: Vec<_> = (0..5)
        .map(|_| client.api("/v2/catalogs", Method::Get, Params::new()))
        .collect();

    for stream in streams {
        let response = stream.live().await.unwrap();
        assert!(!response.from_cache);
    }
    assert!(client.is_connected());
    assert_eq!(server.count("POST", "/v2/sessions").await, 1);
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let server = TestServer::start().await;
    let client = server.client();

    client.connect().await.unwrap();
    client.connect().await.unwrap();

    assert!(client.is_connected());
    assert!(client.attached_user().is_none());
}

#[tokio::test]
async fn test_session_creation_failure_reaches_every_caller() {
    let server = TestServer::bare().await;
    Mock::given(method("POST"))
        .and(path("/v2/sessions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_delay(Duration::from_millis(100))
                .set_body_json(json!({
                    "id": "req-1",
                    "code": 1102,
                    "message": "Invalid API key",
                    "details": "",
                })),
        )
        .mount(&server.server)
        .await;

    let client = server.client();
    let first = client.api("/v2/catalogs", Method::Get, Params::new());
    let second = client.api("/v2/offers", Method::Get, Params::new());

    for stream in [first, second] {
        let err = stream.live().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Session);
        assert_eq!(err.api_code(), Some(1102));
    }
    assert!(!client.is_connected());

    // The next request starts a fresh attempt.
    let err = client.connect().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Session);
    assert_eq!(server.count("POST", "/v2/sessions").await, 2);
}

#[tokio::test]
async fn test_attach_and_detach_user() {
    let server = TestServer::start().await;
    mount_attach(&server).await;
    Mock::given(method("PUT"))
        .and(path("/v2/sessions"))
        .and(body_json(json!({ "email": "" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(TOKEN, None)))
        .expect(1)
        .named("detach user")
        .mount(&server.server)
        .await;

    let client = server.client();
    let mut events = client.subscribe();

    let user = client.connect_with_user("anne@example.com", "hunter2").await.unwrap();
    assert_eq!(user.id, "42");
    assert_eq!(user.ern.as_deref(), Some("ern:user:42"));
    assert_eq!(client.attached_user_id().as_deref(), Some("42"));
    assert!(client.allows_permission("api.users.42.read"));
    assert!(!client.allows_permission("api.users.43.read"));

    let event = events.recv().await.unwrap();
    assert_eq!(event, SessionEvent::UserChanged { user_id: Some("42".into()) });

    client.detach_user().await.unwrap();
    assert!(client.attached_user().is_none());
    assert!(!client.allows_permission("api.public.read"));
    assert!(client.is_connected());

    let event = events.recv().await.unwrap();
    assert_eq!(event, SessionEvent::UserChanged { user_id: None });

    // Nothing attached: no request is made.
    client.detach_user().await.unwrap();
}

#[tokio::test]
async fn test_rejected_login_keeps_session() {
    let server = TestServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v2/sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "id": "req-2",
            "code": 1501,
            "message": "Wrong email or password",
            "details": "",
        })))
        .mount(&server.server)
        .await;

    let client = server.client();
    let err = client.connect_with_user("anne@example.com", "wrong").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.api_code(), Some(1501));
    assert_eq!(err.request_id(), Some("req-2"));
    assert!(client.is_connected());
    assert!(client.attached_user().is_none());
}

#[tokio::test]
async fn test_empty_email_is_rejected_locally() {
    let server = TestServer::bare().await;
    let client = server.client();

    let err = client.attach_user("  ", "hunter2").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(server.server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_rejected_token_creates_new_session() {
    let server = TestServer::bare().await;
    Mock::given(method("POST"))
        .and(path("/v2/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_body("tok_a", None)))
        .up_to_n_times(1)
        .mount(&server.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_body("tok_b", None)))
        .mount(&server.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/offers"))
        .and(header("X-Token", "tok_a"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "id": "req-3",
            "code": 1108,
            "message": "Token expired",
            "details": "",
        })))
        .mount(&server.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/offers"))
        .and(header("X-Token", "tok_b"))
        .and(header("X-Signature", signature("tok_b").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "o1" }])))
        .mount(&server.server)
        .await;

    let client = server.client();

    let err = client.api("/v2/offers", Method::Get, Params::new()).live().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Session);
    assert!(!client.is_connected());

    let response = client.api("/v2/offers", Method::Get, Params::new()).live().await.unwrap();
    assert_eq!(response.payload, json!([{ "id": "o1" }]));
    assert_eq!(server.count("POST", "/v2/sessions").await, 2);
}

#[tokio::test]
async fn test_refreshed_token_is_used_next() {
    let server = TestServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/dealers"))
        .and(header("X-Token", TOKEN))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Token", "tok_rotated")
                .insert_header("X-Token-Expires", EXPIRES)
                .set_body_json(json!([])),
        )
        .expect(1)
        .mount(&server.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/dealers"))
        .and(header("X-Token", "tok_rotated"))
        .and(header("X-Signature", signature("tok_rotated").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "d1" }])))
        .expect(1)
        .mount(&server.server)
        .await;

    let client = server.client();
    client.api("/v2/dealers", Method::Get, Params::new()).live().await.unwrap();
    let second = client.api("/v2/dealers", Method::Get, Params::new()).live().await.unwrap();

    assert_eq!(second.payload, json!([{ "id": "d1" }]));
}
