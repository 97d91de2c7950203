//! Request dispatch.
//!
//! The dispatcher turns an [`ApiRequest`] into one or two deliveries on a
//! [`ResponseStream`]:
//!
//! 1. Without a valid session the request is queued. One drain task creates
//!    the session and releases the queue in submission order, or fails every
//!    queued request with the same error.
//! 2. Geolocation is merged into the parameters and the request is signed.
//! 3. For cacheable requests with `use_cache`, a cached payload is delivered
//!    first.
//! 4. The live request is sent. Its result is always the last delivery and
//!    is stored in the cache on success.

mod stream;

use std::collections::VecDeque;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesOrdered;
use parking_lot::Mutex;

use crate::cache::{RequestSignature, ResponseCache};
use crate::config::CacheConfig;
use crate::geo::GeolocationContext;
use crate::session::{SessionManager, SessionToken};
use crate::transport::{SignedRequest, TransportClient};
use crate::types::{ApiRequest, ApiResponse};
use crate::Result;

pub(crate) use stream::Completion;
pub use stream::ResponseStream;

/// A request waiting for a session.
struct PendingRequest {
    request: ApiRequest,
    completion: Completion,
}

/// A signed request ready to be sent.
struct LiveRequest {
    request: SignedRequest,
    token: SessionToken,
    signature: Option<RequestSignature>,
    completion: Completion,
}

#[derive(Default)]
struct Gate {
    queue: VecDeque<PendingRequest>,
    draining: bool,
}

enum Route {
    Send(PendingRequest, SessionToken),
    Queued { start_drain: bool },
}

#[derive(Clone)]
pub(crate) struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    session: SessionManager,
    transport: Arc<dyn TransportClient>,
    geo: Arc<GeolocationContext>,
    cache: Option<Arc<dyn ResponseCache>>,
    cache_config: CacheConfig,
    gate: Mutex<Gate>,
}

impl Dispatcher {
    pub fn new(
        session: SessionManager,
        transport: Arc<dyn TransportClient>,
        geo: Arc<GeolocationContext>,
        cache: Option<Arc<dyn ResponseCache>>,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                session,
                transport,
                geo,
                cache,
                cache_config,
                gate: Mutex::new(Gate::default()),
            }),
        }
    }

    /// Dispatches a request. Must be called within a Tokio runtime.
    pub fn dispatch(&self, request: ApiRequest) -> ResponseStream {
        let (completion, stream) = Completion::channel();
        let pending = PendingRequest { request, completion };

        match self.route(pending) {
            Route::Send(pending, token) => {
                let live = self.prepare(pending, token);
                let this = self.clone();
                tokio::spawn(async move {
                    let (completion, result) = this.send_live(live).await;
                    completion.finish(result);
                });
            }
            Route::Queued { start_drain: true } => {
                tokio::spawn(self.clone().drain());
            }
            Route::Queued { start_drain: false } => {}
        }

        stream
    }

    /// Sends immediately when a session exists and nothing is queued ahead;
    /// otherwise queues behind the drain task.
    fn route(&self, pending: PendingRequest) -> Route {
        let mut gate = self.inner.gate.lock();

        if !gate.draining && gate.queue.is_empty() {
            if let Some(token) = self.inner.session.current_token() {
                return Route::Send(pending, token);
            }
        }

        gate.queue.push_back(pending);
        if gate.draining {
            return Route::Queued { start_drain: false };
        }
        gate.draining = true;
        Route::Queued { start_drain: true }
    }

    async fn drain(self) {
        loop {
            let session = self.inner.session.ensure_session().await;
            let batch: Vec<PendingRequest> = self.inner.gate.lock().queue.drain(..).collect();

            match session {
                Err(e) => {
                    tracing::debug!(error = %e, failed = batch.len(), "Failing queued requests");
                    for pending in batch {
                        pending.completion.finish(Err(e.clone()));
                    }
                }
                Ok(token) => {
                    tracing::debug!(released = batch.len(), "Releasing queued requests");
                    let mut inflight = FuturesOrdered::new();
                    for pending in batch {
                        let live = self.prepare(pending, token.clone());
                        let this = self.clone();
                        inflight.push_back(async move { this.send_live(live).await });
                    }
                    tokio::spawn(async move {
                        while let Some((completion, result)) = inflight.next().await {
                            completion.finish(result);
                        }
                    });
                }
            }

            let done = {
                let mut gate = self.inner.gate.lock();
                if gate.queue.is_empty() {
                    gate.draining = false;
                    true
                } else {
                    false
                }
            };
            if done {
                return;
            }
        }
    }

    /// Merges geolocation, consults the cache and signs the request.
    fn prepare(&self, pending: PendingRequest, token: SessionToken) -> LiveRequest {
        let PendingRequest { request, completion } = pending;
        let ApiRequest {
            path,
            method,
            mut params,
            use_cache,
        } = request;

        self.inner.geo.snapshot().apply_to(&mut params);

        let signature = match &self.inner.cache {
            Some(_) if self.inner.cache_config.is_cacheable(method, &path) => Some(
                RequestSignature::new(method, &path, &params, self.inner.session.cache_scope()),
            ),
            _ => None,
        };

        if use_cache {
            if let (Some(cache), Some(signature)) = (&self.inner.cache, &signature) {
                match cache.lookup(signature) {
                    Some(payload) => {
                        tracing::debug!(key = ?signature, "Cache hit");
                        completion.deliver_cached(payload);
                    }
                    None => tracing::trace!(key = ?signature, "Cache miss"),
                }
            }
        }

        let request = self.inner.session.sign_request(method, path, params, &token);
        LiveRequest {
            request,
            token,
            signature,
            completion,
        }
    }

    async fn send_live(&self, live: LiveRequest) -> (Completion, Result<ApiResponse>) {
        let LiveRequest {
            request,
            token,
            signature,
            completion,
        } = live;
        let method = request.method;
        let path = request.path.clone();

        let result = match self.inner.transport.send(request).await {
            Ok(raw) => {
                self.inner.session.apply_refresh(&token, &raw.headers);
                raw.into_result()
            }
            Err(e) => Err(e),
        };

        let result = match result {
            Ok(payload) => {
                if let (Some(cache), Some(signature)) = (&self.inner.cache, signature) {
                    cache.store(signature, payload.clone());
                }
                tracing::debug!(%method, %path, "Request succeeded");
                Ok(ApiResponse::live(payload))
            }
            Err(e) => {
                if e.is_session_error() {
                    self.inner.session.mark_expired(&token);
                }
                tracing::debug!(%method, %path, error = %e, "Request failed");
                Err(e)
            }
        };

        (completion, result)
    }
}
