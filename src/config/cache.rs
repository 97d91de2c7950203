//! Cache configuration for API responses.

use std::time::Duration;

use crate::types::Method;

/// Endpoint prefixes whose GET responses are cached by default.
pub const DEFAULT_ITEM_PATHS: &[&str] = &["/v2/catalogs", "/v2/offers", "/v2/dealers", "/v2/stores"];

fn default_item_paths() -> Vec<String> {
    DEFAULT_ITEM_PATHS.iter().map(|p| (*p).to_string()).collect()
}

/// Configuration for local caching of API responses.
///
/// Only GET requests to item and list endpoints are cached, and only when
/// the caller asks for it per request
/// ([`ApiRequest::use_cache`](crate::ApiRequest::use_cache)). A cached
/// delivery is always followed by the live response.
///
/// ## Important: User-scoped entries
///
/// Responses stored while a user is attached may depend on that user's
/// permissions. They are keyed by the user epoch and dropped whenever a
/// user is attached or detached.
///
/// ## Example
///
/// ```rust
/// use eta::CacheConfig;
/// use std::time::Duration;
///
/// // Short TTL for fast-moving offer lists
/// let config = CacheConfig::builder()
///     .ttl(Duration::from_secs(30))
///     .max_entries(500)
///     .build();
///
/// // Only cache catalogs
/// let config = CacheConfig::builder()
///     .item_paths(vec!["/v2/catalogs".to_string()])
///     .build();
/// assert!(!config.is_cacheable(eta::Method::Get, "/v2/offers"));
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct CacheConfig {
    /// Whether caching is enabled.
    #[builder(default = true)]
    pub enabled: bool,

    /// Time-to-live for cached entries.
    #[builder(default = Duration::from_secs(60))]
    pub ttl: Duration,

    /// Maximum number of entries in the cache.
    #[builder(default = 1_000)]
    pub max_entries: usize,

    /// Endpoint prefixes whose GET responses may be cached.
    ///
    /// A path matches a prefix when it is equal to it or continues it with
    /// a `/` (`/v2/catalogs/abc` matches `/v2/catalogs`).
    #[builder(default = default_item_paths())]
    pub item_paths: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CacheConfig {
    /// Creates a configuration with caching disabled.
    pub fn disabled() -> Self {
        Self::builder().enabled(false).build()
    }

    /// Returns `true` if a response to `method` on `path` may be cached.
    ///
    /// Mutating methods are never cacheable.
    pub fn is_cacheable(&self, method: Method, path: &str) -> bool {
        if !self.enabled || method.is_mutating() {
            return false;
        }

        let path = path.trim_end_matches('/');
        self.item_paths.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}
