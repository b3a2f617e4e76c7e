//! Expiring relation cache.
//!
//! Keys are resolved hrefs. Values are hydrated resources or collections
//! stored type-erased behind an `Arc`, so a hit hands back the very instance
//! that was cached. Entries stay in the map after they expire until the
//! sweeper or an explicit eviction removes them; reads simply ignore them.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use halcyon_core::{HalOptions, HalResource, PagedCollection};
use tokio::time::Instant;

type SharedValue = Arc<dyn Any + Send + Sync>;

/// Upper bound used when `now + ttl` does not fit in an `Instant`.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Clone)]
enum CacheValue {
    Resource(SharedValue),
    Collection(SharedValue),
}

#[derive(Clone)]
struct CacheEntry {
    value: CacheValue,
    expires_at: Instant,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(value: CacheValue, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + MAX_TTL);
        Self {
            value,
            expires_at,
            cached_at: Utc::now(),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Metadata of a stored entry, live or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub key: String,
    pub is_collection: bool,
    pub is_live: bool,
    pub cached_at: DateTime<Utc>,
    /// Time left before expiry; zero once expired.
    pub expires_in: Duration,
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Reads answered from a live entry.
    pub hits: u64,
    /// Reads that found nothing usable.
    pub misses: u64,
    /// Entries currently stored, expired ones included.
    pub entry_count: u64,
    /// Entries removed by eviction or sweeping.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct CacheStore {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStore {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store a single resource under `key`, replacing any previous entry.
    /// A zero `ttl` stores it already expired.
    pub fn put<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: Arc<T>, ttl: Duration) {
        let key = key.into();
        tracing::trace!(key = %key, ttl_ms = ttl.as_millis() as u64, "Caching resource");
        self.entries
            .insert(key, CacheEntry::new(CacheValue::Resource(value), ttl));
    }

    /// Store a collection under `key`, replacing any previous entry.
    pub fn put_array<T: Send + Sync + 'static>(
        &self,
        key: impl Into<String>,
        value: Arc<PagedCollection<T>>,
        ttl: Duration,
    ) {
        let key = key.into();
        tracing::trace!(key = %key, ttl_ms = ttl.as_millis() as u64, "Caching collection");
        self.entries
            .insert(key, CacheEntry::new(CacheValue::Collection(value), ttl));
    }

    /// The live single resource stored under `key`, if it is a `T`.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let found = self.live_value(key).and_then(|value| match value {
            CacheValue::Resource(shared) => shared.downcast::<T>().ok(),
            CacheValue::Collection(_) => None,
        });
        self.record(key, found.is_some());
        found
    }

    /// The live collection stored under `key`, if it holds `T` items.
    pub fn get_array<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<PagedCollection<T>>> {
        let found = self.live_value(key).and_then(|value| match value {
            CacheValue::Collection(shared) => shared.downcast::<PagedCollection<T>>().ok(),
            CacheValue::Resource(_) => None,
        });
        self.record(key, found.is_some());
        found
    }

    /// Whether a read of `key` may be served from the cache.
    ///
    /// False when caching is disabled, when `query` would put anything on
    /// the query string, or when no live entry exists.
    pub fn has(&self, key: &str, query: Option<&HalOptions>, enabled: bool) -> bool {
        if !enabled || query.is_some_and(HalOptions::has_query) {
            return false;
        }
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Inspect an entry without touching statistics, expired or not.
    pub fn peek(&self, key: &str) -> Option<EntryInfo> {
        let now = Instant::now();
        self.entries.get(key).map(|entry| EntryInfo {
            key: key.to_string(),
            is_collection: matches!(entry.value, CacheValue::Collection(_)),
            is_live: entry.is_live(now),
            cached_at: entry.cached_at,
            expires_in: entry.expires_at.saturating_duration_since(now),
        })
    }

    /// Remove `key`. Returns whether an entry was present.
    pub fn evict_key(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "Evicted cache entry");
        }
        removed
    }

    /// Remove every key equal to a resolved href in `entity`'s link map.
    /// Returns the number of entries removed.
    pub fn evict_all_keys_for<R: HalResource>(&self, entity: &R) -> usize {
        entity
            .links()
            .values()
            .map(|link| link.resolved_href())
            .filter(|href| self.evict_key(href))
            .count()
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let swept = before.saturating_sub(self.entries.len());
        if swept > 0 {
            self.evictions.fetch_add(swept as u64, Ordering::Relaxed);
        }
        swept
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn live_value(&self, key: &str) -> Option<CacheValue> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        entry.is_live(now).then(|| entry.value.clone())
    }

    fn record(&self, key: &str, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %key, "Cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %key, "Cache miss");
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(Duration::from_millis(halcyon_core::constants::DEFAULT_CACHE_TTL_MS))
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
