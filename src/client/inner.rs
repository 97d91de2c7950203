//! Internal client implementation.

use std::sync::Arc;

use url::Url;

use crate::auth::Credentials;
use crate::cache::ResponseCache;
use crate::config::CacheConfig;
use crate::dispatch::Dispatcher;
use crate::geo::GeolocationContext;
use crate::session::SessionManager;
use crate::transport::TransportClient;

pub(crate) struct ClientInner {
    /// The ETA API base URL.
    pub base_url: Url,

    /// API key, kept for introspection. The secret lives in the session manager.
    pub api_key: String,

    /// Session lifecycle and user state.
    pub session: SessionManager,

    /// Request gate, signing and cache handling.
    pub dispatcher: Dispatcher,

    /// Geolocation merged into every request.
    pub geo: Arc<GeolocationContext>,
}

impl ClientInner {
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: Arc<dyn TransportClient>,
        cache: Option<Arc<dyn ResponseCache>>,
        cache_config: CacheConfig,
        token_ttl: Option<std::time::Duration>,
    ) -> Self {
        let api_key = credentials.api_key().to_string();
        let geo = Arc::new(GeolocationContext::new());
        let session = SessionManager::new(transport.clone(), credentials, token_ttl, cache.clone());
        let dispatcher = Dispatcher::new(session.clone(), transport, geo.clone(), cache, cache_config);

        Self {
            base_url,
            api_key,
            session,
            dispatcher,
            geo,
        }
    }
}
