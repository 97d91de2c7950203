//! Client builder with typestate pattern.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use super::inner::ClientInner;
#[cfg(feature = "rest")]
use crate::transport::RestTransport;
use crate::{
    Client, Error,
    auth::Credentials,
    cache::{InMemoryCache, ResponseCache},
    config::CacheConfig,
    transport::TransportClient,
};

/// Base URL of the production ETA API.
pub const DEFAULT_BASE_URL: &str = "https://api.etilbudsavis.dk/";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Marker type: Credentials not yet provided.
pub struct NoCredentials;

/// Marker type: Credentials have been provided.
pub struct HasCredentials;

/// Builder for creating [`Client`] instances.
///
/// Uses the typestate pattern to ensure credentials are provided at compile
/// time. Their content is validated by [`build()`](ClientBuilder::build).
///
/// ## Required Configuration
///
/// - `credentials()`: API key and secret
///
/// ## Optional Configuration
///
/// - `base_url()`: API endpoint (defaults to [`DEFAULT_BASE_URL`])
/// - `timeout()`: Request timeout
/// - `token_ttl()`: Requested lifetime of session tokens
/// - `cache_config()`: Local caching configuration
/// - `cache()`: Custom cache storage
/// - `transport()`: Custom transport
///
/// ## Example
///
/// ```rust
/// use eta::{CacheConfig, Client};
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .credentials(("api_key", "api_secret"))
///     .timeout(Duration::from_secs(10))
///     .cache_config(CacheConfig::builder().ttl(Duration::from_secs(120)).build())
///     .build()?;
/// # Ok::<(), eta::Error>(())
/// ```
pub struct ClientBuilder<CredentialsState> {
    base_url: Option<String>,
    credentials: Option<Credentials>,
    cache_config: CacheConfig,
    cache: Option<Arc<dyn ResponseCache>>,
    transport: Option<Arc<dyn TransportClient>>,
    timeout: Option<Duration>,
    token_ttl: Option<Duration>,
    insecure: bool,
    _credentials_state: PhantomData<CredentialsState>,
}

impl ClientBuilder<NoCredentials> {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            credentials: None,
            cache_config: CacheConfig::default(),
            cache: None,
            transport: None,
            timeout: None,
            token_ttl: None,
            insecure: false,
            _credentials_state: PhantomData,
        }
    }

    /// Sets the API credentials.
    ///
    /// Accepts [`Credentials`] or an `(api_key, api_secret)` pair.
    pub fn credentials(self, credentials: impl Into<Credentials>) -> ClientBuilder<HasCredentials> {
        ClientBuilder {
            base_url: self.base_url,
            credentials: Some(credentials.into()),
            cache_config: self.cache_config,
            cache: self.cache,
            transport: self.transport,
            timeout: self.timeout,
            token_ttl: self.token_ttl,
            insecure: self.insecure,
            _credentials_state: PhantomData,
        }
    }
}

impl Default for ClientBuilder<NoCredentials> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ClientBuilder<C> {
    /// Overrides the API base URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// let builder = eta::Client::builder().base_url("https://edge.etilbudsavis.dk/");
    /// ```
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the cache configuration.
    #[must_use]
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Replaces the built-in in-memory cache.
    ///
    /// Ignored when the cache configuration is disabled.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the built-in REST transport.
    ///
    /// The base URL, timeout and TLS settings are then up to the transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn TransportClient>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Allows plain HTTP and disables TLS certificate verification.
    ///
    /// **WARNING**: This is insecure and should only be used for local development.
    /// Never use this in production.
    #[must_use]
    pub fn insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Requests a lifetime for session tokens. The server may cap it.
    #[must_use]
    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = Some(ttl);
        self
    }
}

impl ClientBuilder<HasCredentials> {
    /// Builds the client.
    ///
    /// No network I/O happens here. The session is created on first use, or
    /// explicitly with [`Client::connect`].
    ///
    /// # Errors
    ///
    /// Returns a [`Configuration`](crate::ErrorKind::Configuration) error if:
    /// - The API key or secret is empty
    /// - The base URL is invalid, or not HTTPS without `insecure()`
    /// - No transport is available (`rest` feature disabled and none supplied)
    pub fn build(self) -> Result<Client, Error> {
        let credentials = self
            .credentials
            .ok_or_else(|| Error::configuration("credentials are required"))?;
        credentials.validate()?;

        let url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base_url = url::Url::parse(url)
            .map_err(|e| Error::configuration(format!("invalid base URL: {}", e)))?;

        // Ensure HTTPS unless insecure mode is enabled
        if base_url.scheme() != "https" && !self.insecure {
            return Err(Error::configuration(
                "HTTPS is required. Use .insecure() for development with HTTP.",
            ));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let transport: Arc<dyn TransportClient> = match self.transport {
            Some(transport) => transport,
            #[cfg(feature = "rest")]
            None => Arc::new(RestTransport::new(base_url.clone(), timeout, self.insecure)?),
            #[cfg(not(feature = "rest"))]
            None => {
                let _ = timeout;
                return Err(Error::configuration(
                    "no transport available: enable the 'rest' feature or supply one with .transport()",
                ));
            }
        };

        let cache = if self.cache_config.enabled {
            Some(
                self.cache
                    .unwrap_or_else(|| Arc::new(InMemoryCache::from_config(&self.cache_config))),
            )
        } else {
            None
        };

        tracing::debug!(
            base_url = %base_url,
            transport = transport.name(),
            cache = cache.is_some(),
            "Building ETA client"
        );

        let inner = ClientInner::new(
            base_url,
            credentials,
            transport,
            cache,
            self.cache_config,
            self.token_ttl,
        );

        Ok(Client::from_inner(inner))
    }
}
