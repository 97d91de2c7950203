//! REST transport implementation using reqwest.
//!
//! Sends signed requests to the ETA API over HTTP:
//!
//! - GET/DELETE parameters travel in the query string
//! - POST/PUT parameters travel as a JSON body
//! - the session token and signature travel as `X-Token` / `X-Signature`

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::transport::traits::{RawResponse, ResponseHeaders, SignedRequest, TransportClient};
use crate::types::Method;
use crate::user_agent;
use crate::Error;

const TOKEN_HEADER: &str = "X-Token";
const TOKEN_EXPIRES_HEADER: &str = "X-Token-Expires";
const SIGNATURE_HEADER: &str = "X-Signature";

// ============================================================================
// REST Transport
// ============================================================================

/// REST transport using reqwest.
#[derive(Clone)]
pub struct RestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RestTransport {
    /// Creates a new REST transport builder.
    pub fn builder() -> RestTransportBuilder {
        RestTransportBuilder::new()
    }

    /// Creates a new REST transport.
    ///
    /// `accept_invalid_certs` disables TLS verification and must only be used
    /// against local development servers.
    pub fn new(base_url: Url, timeout: Duration, accept_invalid_certs: bool) -> Result<Self, Error> {
        #[allow(unused_mut)]
        let mut client_builder = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent::user_agent());

        #[cfg(feature = "rustls")]
        if base_url.scheme() == "https" {
            client_builder = client_builder.use_rustls_tls();
        }

        #[cfg(any(feature = "rustls", feature = "native-tls"))]
        if accept_invalid_certs {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }
        #[cfg(not(any(feature = "rustls", feature = "native-tls")))]
        let _ = accept_invalid_certs;

        let client = client_builder
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
        })
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an endpoint path against the base URL.
    ///
    /// The leading slash is ignored so that a base URL with a path prefix
    /// (`https://host/api/`) keeps its prefix.
    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn build_headers(request: &SignedRequest) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(ref token) = request.token {
            headers.insert(
                TOKEN_HEADER,
                HeaderValue::from_str(token)
                    .map_err(|_| Error::session("Invalid session token format"))?,
            );
        }
        if let Some(ref signature) = request.signature {
            headers.insert(
                SIGNATURE_HEADER,
                HeaderValue::from_str(signature)
                    .map_err(|_| Error::session("Invalid signature format"))?,
            );
        }

        Ok(headers)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn read_headers(headers: &HeaderMap) -> ResponseHeaders {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    ResponseHeaders {
        token: text(TOKEN_HEADER),
        token_expires: text(TOKEN_EXPIRES_HEADER),
    }
}

#[async_trait::async_trait]
impl TransportClient for RestTransport {
    async fn send(&self, request: SignedRequest) -> Result<RawResponse, Error> {
        let url = self.endpoint(&request.path)?;
        let headers = Self::build_headers(&request)?;

        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        }
        .headers(headers);

        let builder = if request.method.uses_query() {
            builder.query(&request.query_pairs())
        } else {
            builder.json(&request.params)
        };

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = read_headers(response.headers());
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) if (200..300).contains(&status) => return Err(e.into()),
                Err(_) => Value::String(text),
            }
        };

        tracing::trace!(
            method = %request.method,
            path = %request.path,
            status,
            "REST response received"
        );

        Ok(RawResponse { status, headers, body })
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}

// ============================================================================
// REST Transport Builder
// ============================================================================

/// Builder for REST transport.
pub struct RestTransportBuilder {
    base_url: Option<Url>,
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl RestTransportBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
        }
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self, Error> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables TLS certificate verification (local development only).
    #[must_use]
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.accept_invalid_certs = true;
        self
    }

    /// Builds the REST transport.
    pub fn build(self) -> Result<RestTransport, Error> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::configuration("Base URL is required"))?;

        RestTransport::new(base_url, self.timeout, self.accept_invalid_certs)
    }
}

// ============================================================================
// Tests
// ============================================================================
