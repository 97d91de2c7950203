//! Error kind enumeration for categorizing SDK errors.

/// Categorization of SDK errors.
///
/// This enum provides a stable interface for matching on error types, enabling
/// different handling strategies for different failure modes.
///
/// ## Network vs API errors
///
/// | ErrorKind         | Origin    | Retriable | Action                          |
/// |-------------------|-----------|-----------|---------------------------------|
/// | `Connection`      | Network   | Yes       | Retry later                     |
/// | `Timeout`         | Network   | Yes       | Retry later                     |
/// | `Transport`       | Network   | No        | Inspect the underlying cause    |
/// | `Session`         | Session   | Yes       | Next request re-establishes     |
/// | `Authentication`  | Session   | No        | Fix user credentials            |
/// | `Configuration`   | Client    | No        | Fix API key, secret or URL      |
/// | `RateLimited`     | API       | Yes       | Back off                        |
/// | `Unavailable`     | API       | Yes       | Retry later                     |
/// | `Forbidden`       | API       | No        | Attach a user with permission   |
/// | `NotFound`        | API       | No        | Resource doesn't exist          |
/// | `InvalidArgument` | API       | No        | Fix the request parameters      |
///
/// The SDK never retries on its own. "Retriable" is a hint for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid or missing client configuration (API key, secret, base URL).
    ///
    /// Raised at construction time. No client is produced.
    #[error("configuration error")]
    Configuration,

    /// The session could not be created, refreshed, or has expired.
    ///
    /// Every request queued behind a failed session creation receives
    /// this error. The next request starts a fresh attempt.
    #[error("session error")]
    Session,

    /// User credentials were rejected while attaching a user.
    ///
    /// The session itself stays valid (and anonymous).
    #[error("authentication failed")]
    Authentication,

    /// Connection error (DNS, TLS handshake, network unreachable).
    #[error("connection error")]
    Connection,

    /// The request timed out in the transport.
    #[error("timeout")]
    Timeout,

    /// Generic transport failure that fits no narrower category.
    #[error("transport error")]
    Transport,

    /// The API rejected the request parameters.
    ///
    /// HTTP: 400 Bad Request
    #[error("invalid argument")]
    InvalidArgument,

    /// The session lacks permission for the requested action.
    ///
    /// HTTP: 403 Forbidden
    #[error("forbidden")]
    Forbidden,

    /// Requested resource was not found.
    ///
    /// HTTP: 404 Not Found
    #[error("not found")]
    NotFound,

    /// Rate limit exceeded.
    ///
    /// HTTP: 429 Too Many Requests
    #[error("rate limited")]
    RateLimited,

    /// The API is temporarily unavailable.
    ///
    /// HTTP: 5xx
    #[error("service unavailable")]
    Unavailable,

    /// The response could not be parsed.
    #[error("invalid response")]
    InvalidResponse,

    /// Unknown or unexpected error.
    #[error("unknown error")]
    Unknown,
}

impl ErrorKind {
    /// Returns `true` if this error kind is generally safe to retry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eta::ErrorKind;
    ///
    /// assert!(ErrorKind::Timeout.is_retriable());
    /// assert!(!ErrorKind::Authentication.is_retriable());
    /// ```
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Connection
                | ErrorKind::Timeout
                | ErrorKind::Session
                | ErrorKind::RateLimited
                | ErrorKind::Unavailable
        )
    }

    /// Returns `true` if the failure happened below the API, in the network.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ErrorKind::Connection | ErrorKind::Timeout | ErrorKind::Transport
        )
    }

    /// Maps an HTTP status code to an error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::InvalidArgument,
            401 => ErrorKind::Session,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Unavailable,
            _ => ErrorKind::Unknown,
        }
    }
}
