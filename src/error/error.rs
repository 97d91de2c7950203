//! Main error type for the ETA SDK.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use super::ErrorKind;

/// The primary error type for ETA SDK operations.
///
/// `Error` provides context for debugging and error handling:
/// - [`kind()`](Error::kind): Categorization for `match` statements
/// - [`request_id()`](Error::request_id): Server error id for support
/// - [`api_code()`](Error::api_code): Numeric ETA API error code
/// - [`is_retriable()`](Error::is_retriable): Quick retry decision
///
/// ## Error Hierarchy
///
/// ```text
/// Error
/// ├── kind: ErrorKind          (category for matching)
/// ├── message: String          (human-readable description)
/// ├── request_id: Option       (server-assigned error id)
/// ├── api_code: Option         (ETA API error code, e.g. 1101)
/// └── source: Option           (underlying cause)
/// ```
///
/// Errors are cheap to clone. A single session failure is delivered to every
/// request that was queued behind it.
///
/// ## Example
///
/// ```rust
/// use eta::{Error, ErrorKind};
///
/// fn handle_error(err: Error) {
///     match err.kind() {
///         ErrorKind::Authentication => println!("Wrong email or password"),
///         ErrorKind::Session => println!("Session lost, the next call reconnects"),
///         kind if kind.is_network() => println!("Network problem: {}", err),
///         _ => println!("API error: {}", err),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    request_id: Option<String>,
    api_code: Option<u32>,
    source: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eta::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::InvalidArgument, "r_lat out of range");
    /// assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    /// ```
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            request_id: None,
            api_code: None,
            source: None,
        }
    }

    /// Creates an error from a kind with a default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        let message = match kind {
            ErrorKind::Configuration => "invalid client configuration",
            ErrorKind::Session => "session could not be established",
            ErrorKind::Authentication => "user credentials rejected",
            ErrorKind::Connection => "connection failed",
            ErrorKind::Timeout => "request timed out",
            ErrorKind::Transport => "transport failure",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Forbidden => "permission denied",
            ErrorKind::NotFound => "resource not found",
            ErrorKind::RateLimited => "rate limit exceeded",
            ErrorKind::Unavailable => "service unavailable",
            ErrorKind::InvalidResponse => "invalid response",
            ErrorKind::Unknown => "unknown error",
        };
        Self::new(kind, message)
    }

    /// Returns the error kind for categorization.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message without the kind prefix.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the server-assigned error id, if available.
    #[inline]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Returns the ETA API error code, if the server sent one.
    #[inline]
    pub fn api_code(&self) -> Option<u32> {
        self.api_code
    }

    /// Returns `true` if this error is generally safe to retry.
    ///
    /// Equivalent to `self.kind().is_retriable()`.
    #[inline]
    pub fn is_retriable(&self) -> bool {
        self.kind.is_retriable()
    }

    /// Returns `true` if this error signals an invalid or expired session token.
    pub fn is_session_error(&self) -> bool {
        self.kind == ErrorKind::Session
    }

    /// Sets the request ID for this error.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets the ETA API error code for this error.
    #[must_use]
    pub fn with_api_code(mut self, code: u32) -> Self {
        self.api_code = Some(code);
        self
    }

    /// Sets the source error for this error.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Re-labels this error with a new kind, keeping the original as source.
    #[must_use]
    pub(crate) fn wrap(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        let request_id = self.request_id.clone();
        let api_code = self.api_code;
        Self {
            kind,
            message: message.into(),
            request_id,
            api_code,
            source: Some(Arc::new(self)),
        }
    }

    // Convenience constructors for common error types

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Creates a session error.
    pub fn session(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Session, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidResponse, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;

        if let Some(code) = self.api_code {
            write!(f, " (code: {})", code)?;
        }

        if let Some(ref request_id) = self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::configuration(format!("invalid URL: {}", err)).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::invalid_response(format!("JSON error: {}", err)).with_source(err)
    }
}

#[cfg(feature = "rest")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error = if err.is_timeout() {
            Error::timeout(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Error::connection(format!("connection failed: {}", err))
        } else if err.is_decode() {
            Error::invalid_response(format!("failed to read response: {}", err))
        } else {
            Error::new(ErrorKind::Transport, format!("HTTP error: {}", err))
        };
        error.with_source(err)
    }
}
