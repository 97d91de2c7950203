//! Delivered API responses.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Error;

/// A successful API response delivered to the caller.
///
/// `from_cache` tells whether the payload came from the local cache or the
/// network. Cached deliveries are always followed by a live one.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// JSON payload.
    pub payload: Value,
    /// `true` if served from the local cache.
    pub from_cache: bool,
}

impl ApiResponse {
    pub(crate) fn live(payload: Value) -> Self {
        Self { payload, from_cache: false }
    }

    pub(crate) fn cached(payload: Value) -> Self {
        Self { payload, from_cache: true }
    }

    /// Deserializes the payload into a model type.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidResponse`](crate::ErrorKind::InvalidResponse) error
    /// if the payload doesn't match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(T::deserialize(&self.payload)?)
    }

    /// Consumes the response and returns the payload.
    pub fn into_payload(self) -> Value {
        self.payload
    }
}
