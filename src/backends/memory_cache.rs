//! Memory Cache - Concurrent `HashMap` Backend
//!
//! An unbounded in-process backend using `DashMap` for concurrent access.
//! Values are kept as-is, so object handles come back with their identity.

use super::effective_ttl;
use crate::value::CacheValue;
use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Cache entry with optional expiration
#[derive(Debug, Clone)]
struct CacheEntry {
    value: CacheValue,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: CacheValue, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: effective_ttl(ttl).and_then(|ttl| Instant::now().checked_add(ttl)),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() > expires_at)
    }
}

/// Hit/miss/set counters of a [`MemoryCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub size: usize,
}

/// Unbounded concurrent in-process cache
///
/// **Use Case**: request-scoped transient caching, tests, the fast tier of
/// a chained backend.
///
/// **Features**:
/// - Lock-free concurrent reads/writes
/// - Optional per-entry TTL (zero TTL never expires)
/// - Stores object handles without serializing them
///
/// **Limitations**:
/// - No eviction policy and no size limit
/// - Expired entries are dropped lazily on access or via `cleanup_expired`
///
/// **Example**:
/// ```rust
/// use eager_cache::backends::MemoryCache;
/// use eager_cache::traits::CacheBackend;
/// use std::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let cache = MemoryCache::new();
/// cache.save("user:1", "alice".into(), Duration::ZERO).await?;
/// assert!(cache.contains("user:1").await?);
/// # Ok(())
/// # }
/// ```
pub struct MemoryCache {
    /// Concurrent `HashMap`
    map: Arc<DashMap<String, CacheEntry>>,
    /// Hit counter
    hits: Arc<AtomicU64>,
    /// Miss counter
    misses: Arc<AtomicU64>,
    /// Set counter
    sets: Arc<AtomicU64>,
}

impl MemoryCache {
    /// Create new memory cache
    #[must_use]
    pub fn new() -> Self {
        info!("Initializing Memory Cache (DashMap)");

        Self {
            map: Arc::new(DashMap::new()),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            sets: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Remove expired entries, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let mut removed = 0;
        self.map.retain(|_, entry| {
            if entry.is_expired() {
                removed += 1;
                false
            } else {
                true
            }
        });
        if removed > 0 {
            debug!(count = removed, "[Memory] Cleaned up expired entries");
        }
        removed
    }

    /// Get current cache size
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Snapshot of the hit/miss/set counters
    #[must_use]
    pub fn stats(&self) -> MemoryCacheStats {
        MemoryCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            size: self.map.len(),
        }
    }

    fn live_value(&self, key: &str) -> Option<CacheValue> {
        let entry = self.map.get(key)?;
        if entry.is_expired() {
            drop(entry); // Release read lock
            // Only drop it if no fresh value was saved in the meantime
            self.map.remove_if(key, |_, entry| entry.is_expired());
            None
        } else {
            Some(entry.value.clone())
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

// ===== Trait Implementations =====

use crate::traits::CacheBackend;
use async_trait::async_trait;

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        let value = self.live_value(key);
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value)
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.live_value(key).is_some())
    }

    async fn save(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<bool> {
        self.map.insert(key.to_string(), CacheEntry::new(value, ttl));
        self.sets.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, ttl_secs = %ttl.as_secs(), "[Memory] Cached key");
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.map.remove(key);
        Ok(true)
    }

    async fn flush(&self) -> Result<bool> {
        self.map.clear();
        debug!("[Memory] Flushed all entries");
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "Memory"
    }
}
