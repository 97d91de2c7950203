//! In-memory response cache with TTL and LRU eviction.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;

use super::{RequestSignature, ResponseCache};
use crate::config::CacheConfig;

#[derive(Debug)]
struct CacheEntry {
    payload: Value,
    /// `None` when the TTL is too large to represent; such entries never expire.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Bounded in-process cache.
///
/// Expired entries are removed lazily on lookup and before eviction. When
/// full, the least recently used entry is evicted.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: Mutex<LruCache<RequestSignature, CacheEntry>>,
    ttl: Duration,
}

impl InMemoryCache {
    /// Creates a cache holding at most `max_entries` entries for `ttl` each.
    ///
    /// A `ttl` of [`Duration::MAX`] keeps entries until they are evicted.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Creates a cache sized by `config`.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl, config.max_entries)
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn remove_where(
        entries: &mut LruCache<RequestSignature, CacheEntry>,
        predicate: impl Fn(&RequestSignature, &CacheEntry) -> bool,
    ) -> usize {
        let doomed: Vec<RequestSignature> = entries
            .iter()
            .filter(|(key, entry)| predicate(key, entry))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }
}

impl ResponseCache for InMemoryCache {
    fn lookup(&self, signature: &RequestSignature) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let entry = entries.get(signature)?;
        if !entry.is_expired(now) {
            return Some(entry.payload.clone());
        }

        entries.pop(signature);
        tracing::trace!(key = ?signature, "Cache entry expired");
        None
    }

    fn store(&self, signature: RequestSignature, payload: Value) {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if entries.len() >= entries.cap().get() && !entries.contains(&signature) {
            Self::remove_where(&mut entries, |_, entry| entry.is_expired(now));
        }

        let entry = CacheEntry {
            payload,
            expires_at: now.checked_add(self.ttl),
        };
        if let Some((evicted, _)) = entries.push(signature.clone(), entry) {
            if evicted != signature {
                tracing::trace!(key = ?evicted, "Evicted LRU cache entry");
            }
        }
    }

    fn invalidate_user_scoped(&self) {
        let mut entries = self.entries.lock();
        let removed = Self::remove_where(&mut entries, |signature, _| signature.is_user_scoped());
        if removed > 0 {
            tracing::debug!(removed, "Dropped user-scoped cache entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Method, Params};
    use serde_json::json;

    fn signature(path: &str, user_epoch: Option<u64>) -> RequestSignature {
        RequestSignature::new(Method::Get, path, &Params::new(), user_epoch)
    }

    #[test]
    fn test_store_and_lookup() {
        let cache = InMemoryCache::new(Duration::from_secs(60), 10);
        cache.store(signature("/v2/catalogs", None), json!([1]));

        assert_eq!(cache.lookup(&signature("/v2/catalogs", None)), Some(json!([1])));
        assert_eq!(cache.lookup(&signature("/v2/offers", None)), None);
    }

    #[test]
    fn test_store_replaces() {
        let cache = InMemoryCache::new(Duration::from_secs(60), 10);
        cache.store(signature("/v2/catalogs", None), json!([1]));
        cache.store(signature("/v2/catalogs", None), json!([2]));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(&signature("/v2/catalogs", None)), Some(json!([2])));
    }

    #[test]
    fn test_expired_entries_are_not_returned() {
        let cache = InMemoryCache::new(Duration::ZERO, 10);
        cache.store(signature("/v2/catalogs", None), json!([1]));

        assert_eq!(cache.lookup(&signature("/v2/catalogs", None)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = InMemoryCache::new(Duration::from_secs(60), 2);
        cache.store(signature("/v2/a", None), json!("a"));
        cache.store(signature("/v2/b", None), json!("b"));

        // Touch `a` so that `b` becomes least recently used.
        assert!(cache.lookup(&signature("/v2/a", None)).is_some());
        cache.store(signature("/v2/c", None), json!("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.lookup(&signature("/v2/a", None)).is_some());
        assert!(cache.lookup(&signature("/v2/b", None)).is_none());
        assert!(cache.lookup(&signature("/v2/c", None)).is_some());
    }

    #[test]
    fn test_expired_entry_makes_room_before_eviction() {
        let cache = InMemoryCache::new(Duration::ZERO, 2);
        cache.store(signature("/v2/a", None), json!("a"));
        cache.store(signature("/v2/b", None), json!("b"));
        cache.store(signature("/v2/c", None), json!("c"));

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unbounded_ttl_never_expires() {
        let cache = InMemoryCache::new(Duration::MAX, 10);
        cache.store(signature("/v2/catalogs", None), json!([1]));

        assert_eq!(cache.lookup(&signature("/v2/catalogs", None)), Some(json!([1])));
    }

    #[test]
    fn test_invalidate_user_scoped() {
        let cache = InMemoryCache::new(Duration::from_secs(60), 10);
        cache.store(signature("/v2/catalogs", None), json!("anonymous"));
        cache.store(signature("/v2/catalogs", Some(1)), json!("user"));

        cache.invalidate_user_scoped();

        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&signature("/v2/catalogs", Some(1))).is_none());
        assert_eq!(
            cache.lookup(&signature("/v2/catalogs", None)),
            Some(json!("anonymous"))
        );
    }

    #[test]
    fn test_clear() {
        let cache = InMemoryCache::from_config(&CacheConfig::default());
        cache.store(signature("/v2/catalogs", None), json!([]));
        cache.clear();
        assert!(cache.is_empty());
    }
}
