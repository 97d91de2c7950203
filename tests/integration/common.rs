//! Common test harness for ETA Rust SDK integration tests.
//!
//! Provides a mock API server with session endpoints and helpers to build a
//! client pointed at it.

use std::sync::Once;
use std::time::Duration;

use eta::Client;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-key";
pub const API_SECRET: &str = "test-secret";
pub const TOKEN: &str = "tok_session_1";
pub const EXPIRES: &str = "2099-01-01T00:00:00+0000";

static TRACING: Once = Once::new();

/// Installs a test subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// The `X-Signature` value the API expects for `token`.
pub fn signature(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(API_SECRET.as_bytes());
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// A session document as returned by `/v2/sessions`.
pub fn session_body(token: &str, user: Option<Value>) -> Value {
    let permissions = match &user {
        Some(user) => {
            let id = user["id"].as_str().unwrap_or_default();
            json!({
                "group:guest": ["api.public.read"],
                "group:user": [format!("api.users.{id}.*")],
            })
        }
        None => json!({ "group:guest": ["api.public.read"] }),
    };
    json!({
        "token": token,
        "expires": EXPIRES,
        "user": user,
        "permissions": permissions,
    })
}

pub fn user_body() -> Value {
    json!({
        "id": "42",
        "email": "anne@example.com",
        "name": "Anne",
        "gender": "female",
        "birth_year": 1985,
        "ern": "ern:user:42",
    })
}

/// A started mock server with session creation mounted.
pub struct TestServer {
    pub server: MockServer,
}

impl TestServer {
    /// Starts a server that creates exactly one session.
    pub async fn start() -> Self {
        Self::start_with_session_delay(Duration::ZERO).await
    }

    /// Starts a server whose session creation takes `delay`.
    pub async fn start_with_session_delay(delay: Duration) -> Self {
        init_tracing();
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/sessions"))
            .and(body_json(json!({ "api_key": API_KEY })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_delay(delay)
                    .set_body_json(session_body(TOKEN, None)),
            )
            .expect(1)
            .named("create session")
            .mount(&server)
            .await;

        Self { server }
    }

    /// Starts a server without any mounted routes.
    pub async fn bare() -> Self {
        init_tracing();
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn client(&self) -> Client {
        Client::builder()
            .credentials((API_KEY, API_SECRET))
            .base_url(self.server.uri())
            .insecure()
            .build()
            .unwrap()
    }

    /// Number of requests received for `method path`.
    pub async fn count(&self, http_method: &str, endpoint: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path() == endpoint)
            .count()
    }
}
