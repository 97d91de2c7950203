//! API credentials for the ETA SDK.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::Error;

/// An API secret.
///
/// The secret is only used to sign requests. It is never sent over the wire,
/// never printed, and wiped from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ApiSecret(String);

impl ApiSecret {
    /// Wraps a secret string.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }

    fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecret([REDACTED])")
    }
}

impl From<&str> for ApiSecret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ApiSecret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// API key and secret issued to an application.
///
/// ## Example
///
/// ```rust
/// use eta::Credentials;
///
/// let credentials = Credentials::new("my-api-key", "my-api-secret");
/// assert_eq!(credentials.api_key(), "my-api-key");
/// assert!(credentials.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: ApiSecret,
}

impl Credentials {
    /// Creates credentials from an API key and secret.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<ApiSecret>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the API secret.
    pub fn api_secret(&self) -> &ApiSecret {
        &self.api_secret
    }

    /// Checks that neither the key nor the secret is blank.
    ///
    /// # Errors
    ///
    /// Returns a [`Configuration`](crate::ErrorKind::Configuration) error
    /// naming the missing value.
    pub fn validate(&self) -> Result<(), Error> {
        if self.api_key.trim().is_empty() {
            return Err(Error::configuration("API key is required"));
        }
        if self.api_secret.is_empty() {
            return Err(Error::configuration("API secret is required"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl<K, S> From<(K, S)> for Credentials
where
    K: Into<String>,
    S: Into<ApiSecret>,
{
    fn from((key, secret): (K, S)) -> Self {
        Self::new(key, secret)
    }
}
