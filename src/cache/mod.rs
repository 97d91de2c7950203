//! Response cache boundary.
//!
//! The dispatcher consults a [`ResponseCache`] before cacheable requests and
//! stores every successful live response back into it. The cache itself is a
//! collaborator: the SDK ships [`InMemoryCache`], and any other storage can
//! be plugged in through [`ClientBuilder::cache`](crate::ClientBuilder::cache).

mod memory;

use std::fmt;

use serde_json::Value;

use crate::transport::traits::query_value;
use crate::types::{Method, Params};

pub use memory::InMemoryCache;

/// Normalized cache key of a request.
///
/// Built from the method, the path (without trailing slash) and the
/// parameters sorted by name, after geolocation has been merged in.
/// Requests made while a user is attached also carry the user epoch, so
/// entries stored for one user never answer lookups for another.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RequestSignature {
    key: String,
    user_epoch: Option<u64>,
}

impl RequestSignature {
    /// Creates the signature of a request.
    ///
    /// `user_epoch` is `Some` when a user is attached.
    pub fn new(method: Method, path: &str, params: &Params, user_epoch: Option<u64>) -> Self {
        let mut pairs: Vec<(&String, String)> = params
            .iter()
            .filter_map(|(k, v)| query_value(v).map(|v| (k, v)))
            .collect();
        pairs.sort();

        let query = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let path = path.trim_end_matches('/');
        let key = if query.is_empty() {
            format!("{} {}", method, path)
        } else {
            format!("{} {}?{}", method, path, query)
        };

        Self { key, user_epoch }
    }

    /// Returns the normalized request key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the user epoch this signature belongs to, if any.
    pub fn user_epoch(&self) -> Option<u64> {
        self.user_epoch
    }

    /// Returns `true` if the response depends on the attached user.
    pub fn is_user_scoped(&self) -> bool {
        self.user_epoch.is_some()
    }
}

impl fmt::Debug for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_epoch {
            Some(epoch) => write!(f, "{} [user epoch {}]", self.key, epoch),
            None => f.write_str(&self.key),
        }
    }
}

/// Storage for previously seen API responses.
///
/// Implementations must give read-your-writes within one process. They are
/// called synchronously from the dispatcher and should not block for long.
pub trait ResponseCache: Send + Sync {
    /// Returns the payload stored under `signature`, if still valid.
    fn lookup(&self, signature: &RequestSignature) -> Option<Value>;

    /// Stores a payload, replacing any previous one.
    fn store(&self, signature: RequestSignature, payload: Value);

    /// Drops every entry that depends on the attached user.
    fn invalidate_user_scoped(&self);
}
