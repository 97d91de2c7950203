//! Session lifecycle: creation, refresh, expiry and user attach/detach.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::{broadcast, oneshot};

use super::events::SessionEvent;
use super::SESSIONS_PATH;
use super::state::{Session, SessionDocument, SessionToken, State, Validity, parse_expires};
use crate::auth::{Credentials, signature};
use crate::cache::ResponseCache;
use crate::transport::{ResponseHeaders, SignedRequest, TransportClient, is_session_error_code};
use crate::types::{Method, Params, Permissions, User};
use crate::{Error, ErrorKind, Result};

const EVENT_CAPACITY: usize = 16;

/// Owns the session token, the attached user and the permission set.
///
/// Nothing else mutates the session. Cloning is cheap and shares state.
#[derive(Clone)]
pub(crate) struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    transport: Arc<dyn TransportClient>,
    credentials: Credentials,
    token_ttl: Option<Duration>,
    cache: Option<Arc<dyn ResponseCache>>,
    events: broadcast::Sender<SessionEvent>,
    shared: Mutex<Shared>,
}

struct Shared {
    state: State,
    /// Bumped on every user change. Cache keys of user-scoped requests
    /// carry it, so entries never outlive the user they were made for.
    user_epoch: u64,
}

impl Shared {
    fn user_changed(&mut self, user_id: Option<String>) -> SessionEvent {
        self.user_epoch += 1;
        SessionEvent::UserChanged { user_id }
    }
}

/// Outcome of joining the single-flight session creation.
enum Join {
    Ready(SessionToken),
    Waiting,
    Leader(Option<SessionEvent>),
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.inner.shared.lock().state)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn TransportClient>,
        credentials: Credentials,
        token_ttl: Option<Duration>,
        cache: Option<Arc<dyn ResponseCache>>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                transport,
                credentials,
                token_ttl,
                cache,
                events,
                shared: Mutex::new(Shared {
                    state: State::Absent,
                    user_epoch: 0,
                }),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Session creation
    // ------------------------------------------------------------------------

    /// Returns a valid session token, creating a session if needed.
    ///
    /// Concurrent callers share one creation call and are resolved in the
    /// order they joined. A failed attempt is reported to every waiter and
    /// the next call starts over.
    pub async fn ensure_session(&self) -> Result<SessionToken> {
        let (tx, rx) = oneshot::channel();

        match self.join(tx) {
            Join::Ready(token) => return Ok(token),
            Join::Waiting => {}
            Join::Leader(dropped) => {
                if let Some(event) = dropped {
                    self.publish(event);
                }
                let this = self.clone();
                tokio::spawn(async move { this.establish().await });
            }
        }

        rx.await
            .unwrap_or_else(|_| Err(Error::session("Session creation was abandoned")))
    }

    fn join(&self, waiter: oneshot::Sender<Result<SessionToken>>) -> Join {
        let mut shared = self.inner.shared.lock();

        let dropped_user = match &mut shared.state {
            State::Active(session) if session.is_valid(Utc::now()) => {
                return Join::Ready(session.token.clone());
            }
            State::Establishing(waiters) => {
                waiters.push(waiter);
                return Join::Waiting;
            }
            State::Active(session) => {
                tracing::info!("Session expired, creating a new one");
                session.user.is_some()
            }
            State::Absent => false,
        };

        shared.state = State::Establishing(vec![waiter]);
        Join::Leader(dropped_user.then(|| shared.user_changed(None)))
    }

    async fn establish(&self) {
        let mut params = Params::new();
        params.insert("api_key".into(), json!(self.inner.credentials.api_key()));
        if let Some(ttl) = self.inner.token_ttl {
            params.insert("token_ttl".into(), json!(ttl.as_secs()));
        }

        tracing::debug!(transport = self.inner.transport.name(), "Creating session");
        let request = SignedRequest::unsigned(Method::Post, SESSIONS_PATH, params);
        let result = match self.inner.transport.send(request).await {
            Ok(raw) => raw.into_result().and_then(SessionDocument::parse),
            Err(e) => Err(e),
        }
        .map(Session::from_document)
        .and_then(|session| {
            // A token that is already expired must never reach a request.
            if session.is_valid(Utc::now()) {
                Ok(session)
            } else {
                Err(Error::session("Server issued an expired session"))
            }
        });

        let mut event = None;
        let (waiters, outcome) = {
            let mut shared = self.inner.shared.lock();
            let waiters = match std::mem::replace(&mut shared.state, State::Absent) {
                State::Establishing(waiters) => waiters,
                other => {
                    shared.state = other;
                    Vec::new()
                }
            };

            let outcome = match result {
                Ok(session) => {
                    let token = session.token.clone();
                    let user_id = session.user.as_ref().map(|u| u.id.clone());
                    shared.state = State::Active(session);
                    if user_id.is_some() {
                        event = Some(shared.user_changed(user_id));
                    }
                    tracing::info!(waiters = waiters.len(), "Session established");
                    Ok(token)
                }
                Err(e) => {
                    tracing::warn!(error = %e, waiters = waiters.len(), "Session creation failed");
                    if e.kind().is_network() {
                        Err(e)
                    } else {
                        let message = format!("Failed to create session: {}", e.message());
                        Err(e.wrap(ErrorKind::Session, message))
                    }
                }
            };
            (waiters, outcome)
        };

        if let Some(event) = event {
            self.publish(event);
        }
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    // ------------------------------------------------------------------------
    // Token use
    // ------------------------------------------------------------------------

    /// Returns the current token if the session is valid. Never does I/O.
    pub fn current_token(&self) -> Option<SessionToken> {
        match &self.inner.shared.lock().state {
            State::Active(session) if session.is_valid(Utc::now()) => Some(session.token.clone()),
            _ => None,
        }
    }

    /// Signs a request with `token`.
    pub fn sign_request(
        &self,
        method: Method,
        path: impl Into<String>,
        params: Params,
        token: &SessionToken,
    ) -> SignedRequest {
        let mut request = SignedRequest::unsigned(method, path, params);
        request.signature = Some(signature::sign(
            self.inner.credentials.api_secret(),
            token.as_str(),
        ));
        request.token = Some(token.as_str().to_string());
        request
    }

    /// Applies `X-Token` / `X-Token-Expires` from a response to a request
    /// made with `sent`.
    pub fn apply_refresh(&self, sent: &SessionToken, headers: &ResponseHeaders) {
        if headers.token.is_none() && headers.token_expires.is_none() {
            return;
        }

        let mut shared = self.inner.shared.lock();
        let State::Active(session) = &mut shared.state else {
            return;
        };
        if session.token != *sent {
            return;
        }

        if let Some(token) = headers.token.as_deref().filter(|t| *t != sent.as_str()) {
            session.token = SessionToken::new(token);
            tracing::debug!("Session token refreshed");
        }
        if let Some(expires) = headers.token_expires.as_deref().and_then(parse_expires) {
            session.expires = Some(expires);
        }
    }

    /// Moves the session created with `sent` to `Expired`.
    ///
    /// Called when the server rejects the token. The next use creates a new
    /// session. An attached user is dropped.
    pub fn mark_expired(&self, sent: &SessionToken) {
        let event = {
            let mut shared = self.inner.shared.lock();
            let dropped_user = match &mut shared.state {
                State::Active(session)
                    if session.token == *sent && session.validity == Validity::Valid =>
                {
                    tracing::warn!("Server rejected the session token, marking session expired");
                    session.validity = Validity::Expired;
                    session.permissions = Permissions::new();
                    session.user.take().is_some()
                }
                _ => false,
            };
            dropped_user.then(|| shared.user_changed(None))
        };

        if let Some(event) = event {
            self.publish(event);
        }
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    /// Authenticates a user and attaches them to the session.
    ///
    /// On failure the session is left as it was.
    pub async fn attach_user(&self, email: &str, password: &str) -> Result<User> {
        if email.trim().is_empty() {
            return Err(Error::invalid_argument("Email must not be empty"));
        }

        let token = self.ensure_session().await?;

        let mut params = Params::new();
        params.insert("email".into(), json!(email));
        params.insert("password".into(), json!(password));
        let request = self.sign_request(Method::Put, SESSIONS_PATH, params, &token);

        let raw = self.inner.transport.send(request).await?;
        let body = match raw.into_result() {
            Ok(body) => body,
            Err(e) if e.api_code().is_some_and(is_session_error_code) => {
                self.mark_expired(&token);
                return Err(e);
            }
            Err(e) => {
                tracing::info!(error = %e, "User authentication rejected");
                let message = format!("User authentication failed: {}", e.message());
                return Err(e.wrap(ErrorKind::Authentication, message));
            }
        };

        let document = SessionDocument::parse(body)?;
        let user = document
            .user
            .clone()
            .ok_or_else(|| Error::authentication("Session document has no user"))?;

        let event = {
            let mut shared = self.inner.shared.lock();
            match &mut shared.state {
                State::Active(session) if session.token == token => {
                    *session = Session::from_document(document);
                }
                _ => return Err(Error::session("Session was replaced while attaching user")),
            }
            shared.user_changed(Some(user.id.clone()))
        };

        tracing::info!(user_id = %user.id, "User attached to session");
        self.publish(event);
        Ok(user)
    }

    /// Detaches the user from the session. The token stays valid.
    ///
    /// Succeeds without a network call when no user is attached.
    pub async fn detach_user(&self) -> Result<()> {
        if self.attached_user_id().is_none() {
            return Ok(());
        }

        let token = self.ensure_session().await?;
        // Re-creating an expired session already dropped the user.
        if self.attached_user_id().is_none() {
            return Ok(());
        }

        let mut params = Params::new();
        params.insert("email".into(), json!(""));
        let request = self.sign_request(Method::Put, SESSIONS_PATH, params, &token);

        let raw = self.inner.transport.send(request).await?;
        let body = match raw.into_result() {
            Ok(body) => body,
            Err(e) if e.api_code().is_some_and(is_session_error_code) => {
                self.mark_expired(&token);
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let document = SessionDocument::parse(body)?;

        let event = {
            let mut shared = self.inner.shared.lock();
            match &mut shared.state {
                State::Active(session) if session.token == token => {
                    let mut next = Session::from_document(document);
                    next.user = None;
                    *session = next;
                }
                _ => return Err(Error::session("Session was replaced while detaching user")),
            }
            shared.user_changed(None)
        };

        tracing::info!("User detached from session");
        self.publish(event);
        Ok(())
    }

    /// Returns `true` if the attached user may perform `action`.
    ///
    /// Always `false` without an attached user.
    pub fn allows_permission(&self, action: &str) -> bool {
        match &self.inner.shared.lock().state {
            State::Active(session) if session.user.is_some() => session.permissions.allows(action),
            _ => false,
        }
    }

    /// Returns a copy of the attached user.
    pub fn attached_user(&self) -> Option<User> {
        match &self.inner.shared.lock().state {
            State::Active(session) => session.user.clone(),
            _ => None,
        }
    }

    /// Returns the identifier of the attached user.
    pub fn attached_user_id(&self) -> Option<String> {
        match &self.inner.shared.lock().state {
            State::Active(session) => session.user.as_ref().map(|u| u.id.clone()),
            _ => None,
        }
    }

    /// Returns `true` if a valid session exists.
    pub fn is_connected(&self) -> bool {
        self.current_token().is_some()
    }

    /// Returns the user epoch when a user is attached.
    pub fn cache_scope(&self) -> Option<u64> {
        let shared = self.inner.shared.lock();
        match &shared.state {
            State::Active(session) if session.user.is_some() => Some(shared.user_epoch),
            _ => None,
        }
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_user_scoped();
        }
        tracing::debug!(event = event.name(), "Publishing session event");
        let _ = self.inner.events.send(event);
    }
}
