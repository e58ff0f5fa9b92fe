//! Time-bounded cache for call results.
//!
//! A thin layer over [`moka::future::Cache`]: entries expire a fixed
//! duration after insertion and the cache holds a bounded number of them.
//! Hit, miss, eviction and expiry counts are tracked alongside.

use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use moka::notification::RemovalCause;
use tracing::{debug, trace};

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed.
    pub expirations: u64,
}

#[derive(Default)]
struct StatsTracker {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl StatsTracker {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}

/// Bounded key/value cache with a per-cache time-to-live.
pub struct TtlCache<K, V> {
    capacity: usize,
    ttl: Duration,
    cache: Cache<K, V>,
    stats: Arc<StatsTracker>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache holding at most `capacity` entries for `ttl` each.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        let stats = Arc::new(StatsTracker::default());
        let listener_stats = Arc::clone(&stats);

        let cache = Cache::builder()
            .max_capacity(capacity as u64)
            .time_to_live(ttl)
            .eviction_listener(move |key: Arc<K>, _value: V, cause| match cause {
                RemovalCause::Expired => {
                    debug!(key = ?key, "cache entry expired");
                    listener_stats.expirations.fetch_add(1, Ordering::Relaxed);
                }
                RemovalCause::Size => {
                    debug!(key = ?key, reason = "capacity", "evicted cache entry");
                    listener_stats.evictions.fetch_add(1, Ordering::Relaxed);
                }
                _ => {}
            })
            .build();

        Self {
            capacity,
            ttl,
            cache,
            stats,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        match self.cache.get(key).await {
            Some(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                trace!(key = ?key, "cache hit");
                Some(value)
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                trace!(key = ?key, "cache miss");
                None
            }
        }
    }

    /// Insert or replace an entry, starting a fresh TTL.
    pub async fn insert(&self, key: K, value: V) {
        self.cache.insert(key, value).await;
    }

    /// Number of live entries after pending evictions are applied.
    pub async fn len(&self) -> usize {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count() as usize
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        self.stats.snapshot()
    }
}
