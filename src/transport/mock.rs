//! Mock transport implementation for testing.
//!
//! This module provides a mock transport that operates entirely in-memory,
//! allowing tests to run without network dependencies.
//!
//! Out of the box it answers the session endpoint the way the ETA API does:
//! `POST /v2/sessions` creates a session with a fresh token, and
//! `PUT /v2/sessions` attaches or detaches a registered user. Any other
//! route must be scripted with [`MockTransport::on`] or
//! [`MockTransport::on_json`]; unscripted routes answer `404`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::{Value, json};

use super::traits::{RawResponse, SignedRequest, TransportClient};
use crate::session::SESSIONS_PATH;
use crate::types::{Method, User};
use crate::Error;

type Handler = Arc<dyn Fn(&SignedRequest) -> RawResponse + Send + Sync>;

/// Mock transport for testing.
///
/// Records every request it receives, so tests can assert on what was sent:
///
/// ```rust
/// use eta::{Method, MockTransport};
/// use serde_json::json;
///
/// let transport = MockTransport::new();
/// transport.on_json(Method::Get, "/v2/dealers", json!([{ "id": "d1" }]));
/// assert_eq!(transport.count(Method::Get, "/v2/dealers"), 0);
/// ```
pub struct MockTransport {
    routes: RwLock<HashMap<(Method, String), Handler>>,
    accounts: RwLock<HashMap<String, (String, User)>>,
    requests: Mutex<Vec<SignedRequest>>,
    sessions_created: AtomicU64,
    latency: RwLock<Option<Duration>>,
    simulate_failure: Mutex<Option<Error>>,
}

impl MockTransport {
    /// Creates a new mock transport with the default session handlers.
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            accounts: RwLock::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            sessions_created: AtomicU64::new(0),
            latency: RwLock::new(None),
            simulate_failure: Mutex::new(None),
        }
    }

    /// Scripts a route. Replaces any previous handler for the same route,
    /// including the built-in session handlers.
    pub fn on<F>(&self, method: Method, path: impl Into<String>, handler: F)
    where
        F: Fn(&SignedRequest) -> RawResponse + Send + Sync + 'static,
    {
        self.routes
            .write()
            .insert((method, path.into()), Arc::new(handler));
    }

    /// Scripts a route that always answers `200` with `body`.
    pub fn on_json(&self, method: Method, path: impl Into<String>, body: Value) {
        self.on(method, path, move |_| RawResponse::new(200, body.clone()));
    }

    /// Registers a user that `PUT /v2/sessions` accepts.
    pub fn add_user(&self, password: impl Into<String>, user: User) {
        self.accounts
            .write()
            .insert(user.email.clone(), (password.into(), user));
    }

    /// Delays every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = Some(latency);
    }

    /// Sets a failure to simulate on the next request.
    pub fn set_failure(&self, error: Error) {
        *self.simulate_failure.lock() = Some(error);
    }

    /// Clears any simulated failure.
    pub fn clear_failure(&self) {
        *self.simulate_failure.lock() = None;
    }

    /// Returns every request received so far, in order.
    pub fn requests(&self) -> Vec<SignedRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the number of requests made to one route.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Returns the number of sessions created by the default handler.
    pub fn sessions_created(&self) -> u64 {
        self.sessions_created.load(Ordering::SeqCst)
    }

    fn handle(&self, request: &SignedRequest) -> RawResponse {
        let handler = self
            .routes
            .read()
            .get(&(request.method, request.path.clone()))
            .cloned();

        match handler {
            Some(handler) => handler(request),
            None if request.path == SESSIONS_PATH => self.handle_session(request),
            None => RawResponse::new(
                404,
                json!({ "code": 1300, "message": "Not found", "details": request.path }),
            ),
        }
    }

    fn handle_session(&self, request: &SignedRequest) -> RawResponse {
        match request.method {
            Method::Post => {
                let n = self.sessions_created.fetch_add(1, Ordering::SeqCst) + 1;
                RawResponse::new(201, session_document(&format!("mock-token-{}", n), None))
            }
            Method::Put => {
                let Some(token) = request.token.as_deref() else {
                    return RawResponse::new(
                        400,
                        json!({ "code": 1101, "message": "Missing token" }),
                    );
                };

                let email = request
                    .params
                    .get("email")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if email.is_empty() {
                    return RawResponse::new(200, session_document(token, None));
                }

                let password = request
                    .params
                    .get("password")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                match self.accounts.read().get(email) {
                    Some((expected, user)) if expected == password => {
                        RawResponse::new(200, session_document(token, Some(user)))
                    }
                    _ => RawResponse::new(
                        401,
                        json!({
                            "code": 1501,
                            "message": "Invalid credentials",
                            "details": "Unknown email or wrong password"
                        }),
                    ),
                }
            }
            _ => RawResponse::new(405, json!({ "message": "Method not allowed" })),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("routes", &self.routes.read().len())
            .field("requests", &self.request_count())
            .finish_non_exhaustive()
    }
}

/// Builds a session document as the API returns it, expiring in one day.
pub fn session_document(token: &str, user: Option<&User>) -> Value {
    let expires = (Utc::now() + chrono::Duration::days(1))
        .format("%Y-%m-%dT%H:%M:%S%z")
        .to_string();

    let permissions = match user {
        Some(user) => {
            let mut permissions = serde_json::to_value(&user.permissions).unwrap_or(Value::Null);
            if let Some(map) = permissions.as_object_mut() {
                map.entry("group:guest")
                    .or_insert_with(|| json!(["api.public.request"]));
            }
            permissions
        }
        None => json!({ "group:guest": ["api.public.request"] }),
    };

    json!({
        "token": token,
        "expires": expires,
        "user": user,
        "permissions": permissions,
    })
}

#[async_trait::async_trait]
impl TransportClient for MockTransport {
    async fn send(&self, request: SignedRequest) -> Result<RawResponse, Error> {
        self.requests.lock().push(request.clone());

        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self.simulate_failure.lock().take();
        if let Some(error) = failure {
            return Err(error);
        }

        Ok(self.handle(&request))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Params, Permissions};

    fn user() -> User {
        User {
            id: "7".into(),
            email: "anne@example.com".into(),
            name: Some("Anne".into()),
            gender: None,
            birth_year: None,
            ern: Some("ern:user:7".into()),
            permissions: Permissions::from_groups([("group:user", vec!["api.users.7.*"])]),
        }
    }

    fn put(token: Option<&str>, params: Value) -> SignedRequest {
        let mut request = SignedRequest::unsigned(
            Method::Put,
            SESSIONS_PATH,
            params.as_object().cloned().unwrap_or_default(),
        );
        request.token = token.map(str::to_string);
        request
    }

    #[tokio::test]
    async fn test_create_session_issues_fresh_tokens() {
        let transport = MockTransport::new();
        let request = SignedRequest::unsigned(Method::Post, SESSIONS_PATH, Params::new());

        let first = transport.send(request.clone()).await.unwrap();
        let second = transport.send(request).await.unwrap();

        assert_eq!(first.body["token"], "mock-token-1");
        assert_eq!(second.body["token"], "mock-token-2");
        assert_eq!(transport.sessions_created(), 2);
        assert_eq!(transport.count(Method::Post, SESSIONS_PATH), 2);
    }

    #[tokio::test]
    async fn test_attach_registered_user() {
        let transport = MockTransport::new();
        transport.add_user("hunter2", user());

        let response = transport
            .send(put(
                Some("tok"),
                json!({ "email": "anne@example.com", "password": "hunter2" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body["token"], "tok");
        assert_eq!(response.body["user"]["id"], "7");
        assert!(response.body["permissions"]["group:user"].is_array());
    }

    #[tokio::test]
    async fn test_attach_wrong_password() {
        let transport = MockTransport::new();
        transport.add_user("hunter2", user());

        let response = transport
            .send(put(
                Some("tok"),
                json!({ "email": "anne@example.com", "password": "nope" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(response.body["code"], 1501);
    }

    #[tokio::test]
    async fn test_detach_keeps_token() {
        let transport = MockTransport::new();
        let response = transport
            .send(put(Some("tok"), json!({ "email": "" })))
            .await
            .unwrap();
        assert_eq!(response.body["token"], "tok");
        assert!(response.body["user"].is_null());
    }

    #[tokio::test]
    async fn test_scripted_route_and_unknown_route() {
        let transport = MockTransport::new();
        transport.on_json(Method::Get, "/v2/dealers", json!([{ "id": "d1" }]));

        let ok = transport
            .send(SignedRequest::unsigned(Method::Get, "/v2/dealers", Params::new()))
            .await
            .unwrap();
        assert_eq!(ok.body[0]["id"], "d1");

        let missing = transport
            .send(SignedRequest::unsigned(Method::Get, "/v2/nothing", Params::new()))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn test_simulated_failure_applies_once() {
        let transport = MockTransport::new();
        transport.set_failure(Error::connection("connection refused"));

        let request = SignedRequest::unsigned(Method::Post, SESSIONS_PATH, Params::new());
        let err = transport.send(request.clone()).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Connection);

        assert!(transport.send(request).await.is_ok());
        assert_eq!(transport.request_count(), 2);
    }
}
