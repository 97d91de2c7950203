//! Transport trait definitions and wire types.
//!
//! The transport is the boundary between the dispatch core and the network.
//! It makes exactly one attempt per call. Timeouts and connection handling
//! belong to the implementation; the core never retries.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::types::{Method, Params};
use crate::{Error, ErrorKind};

/// API error codes in this range reject the session token itself
/// (expired, invalid, bad signature).
pub(crate) const SESSION_ERROR_CODES: std::ops::RangeInclusive<u32> = 1100..=1199;

/// Returns `true` if an ETA API error code rejects the session token.
pub fn is_session_error_code(code: u32) -> bool {
    SESSION_ERROR_CODES.contains(&code)
}

// ============================================================================
// Request
// ============================================================================

/// A fully prepared request, ready for the wire.
///
/// `params` already contain the geolocation. `token` and `signature` are
/// absent only for the session-creation call.
#[derive(Clone, PartialEq)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: Method,
    /// Endpoint path relative to the base URL.
    pub path: String,
    /// Query or body parameters.
    pub params: Params,
    /// Session token (`X-Token`).
    pub token: Option<String>,
    /// Request signature (`X-Signature`).
    pub signature: Option<String>,
}

impl SignedRequest {
    /// Creates an unsigned request.
    pub fn unsigned(method: Method, path: impl Into<String>, params: Params) -> Self {
        Self {
            method,
            path: path.into(),
            params,
            token: None,
            signature: None,
        }
    }

    /// Flattens the parameters into query pairs.
    ///
    /// Arrays are joined with commas (`catalog_ids=a,b`), nulls are dropped,
    /// and objects are sent as JSON text.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter_map(|(key, value)| query_value(value).map(|v| (key.clone(), v)))
            .collect()
    }
}

impl fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("signed", &self.signature.is_some())
            .finish_non_exhaustive()
    }
}

pub(crate) fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

// ============================================================================
// Response
// ============================================================================

/// Session-related headers returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    /// Replacement session token (`X-Token`).
    pub token: Option<String>,
    /// New expiry of the session token (`X-Token-Expires`).
    pub token_expires: Option<String>,
}

/// An HTTP response as received, before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Session-related headers.
    pub headers: ResponseHeaders,
    /// Parsed JSON body, or `Null` when empty.
    pub body: Value,
}

/// Error document returned by the ETA API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl RawResponse {
    /// Creates a response with no session headers.
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: ResponseHeaders::default(),
            body,
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Interprets the response: the payload on success, a typed error otherwise.
    ///
    /// Error codes in the session range map to
    /// [`ErrorKind::Session`] regardless of HTTP status.
    pub fn into_result(self) -> Result<Value, Error> {
        if self.is_success() {
            return Ok(self.body);
        }

        let status = self.status;
        let body = serde_json::from_value::<ApiErrorBody>(self.body.clone()).ok();
        let code = body.as_ref().and_then(|b| b.code);

        let kind = match code {
            Some(code) if is_session_error_code(code) => ErrorKind::Session,
            _ => ErrorKind::from_status(status),
        };

        let message = body
            .as_ref()
            .and_then(|b| {
                match (&b.message, &b.details) {
                    (Some(m), Some(d)) => Some(format!("{} ({})", m, d)),
                    (Some(m), None) => Some(m.clone()),
                    (None, Some(d)) => Some(d.clone()),
                    (None, None) => None,
                }
            })
            .or_else(|| self.body.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", status));

        let mut error = Error::new(kind, message);
        if let Some(code) = code {
            error = error.with_api_code(code);
        }
        if let Some(id) = body.and_then(|b| b.id) {
            error = error.with_request_id(id);
        }
        Err(error)
    }
}

// ============================================================================
// Transport trait
// ============================================================================

/// A transport that delivers signed requests to the API.
///
/// Implementations must be cheap to share (`Arc<dyn TransportClient>`) and
/// must return `Ok` for any HTTP response, including 4xx/5xx. `Err` is
/// reserved for failures where no response was received.
#[async_trait::async_trait]
pub trait TransportClient: Send + Sync {
    /// Sends one request. Single attempt, no retries.
    async fn send(&self, request: SignedRequest) -> Result<RawResponse, Error>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
