//! Moka Cache - Bounded In-Memory Backend
//!
//! In-process backend with a capacity bound and automatic eviction, for
//! long-lived processes where an unbounded map is not acceptable.

use super::effective_ttl;
use crate::value::CacheValue;
use anyhow::Result;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Cache entry with optional per-key expiration
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

/// Configuration for `MokaCache`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MokaCacheConfig {
    /// Max number of entries
    pub max_capacity: u64,
    /// Upper bound on any entry's lifetime
    #[serde(with = "duration_secs")]
    pub time_to_live: Duration,
    /// Entries not read for this long are evicted
    #[serde(with = "duration_secs")]
    pub time_to_idle: Duration,
}

impl Default for MokaCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 2000,
            time_to_live: Duration::from_secs(3600),
            time_to_idle: Duration::from_secs(120),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Moka in-memory cache with per-key TTL support
///
/// - Fast in-memory access
/// - Capacity-bounded with automatic eviction
/// - Per-key TTL on top of the global `time_to_live` safety net
pub struct MokaCache {
    /// Moka cache instance
    cache: Cache<String, CacheEntry>,
}

impl MokaCache {
    /// Create new Moka cache
    #[must_use]
    pub fn new(config: MokaCacheConfig) -> Self {
        info!("Initializing Moka Cache");

        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.time_to_live)
            .time_to_idle(config.time_to_idle)
            .build();

        info!(
            capacity = config.max_capacity,
            "Moka Cache initialized with per-key TTL support"
        );

        Self { cache }
    }

    async fn live_value(&self, key: &str) -> Option<CacheValue> {
        // Expired entries stay until the global `time_to_live` evicts them
        self.cache
            .get(key)
            .await
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value)
    }
}

impl Default for MokaCache {
    fn default() -> Self {
        Self::new(MokaCacheConfig::default())
    }
}

// ===== Trait Implementations =====

use crate::traits::CacheBackend;
use async_trait::async_trait;

#[async_trait]
impl CacheBackend for MokaCache {
    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        Ok(self.live_value(key).await)
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.live_value(key).await.is_some())
    }

    async fn save(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<bool> {
        self.cache
            .insert(key.to_string(), CacheEntry::new(value, ttl))
            .await;
        debug!(key = %key, ttl_secs = %ttl.as_secs(), "[Moka] Cached key");
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.cache.remove(key).await;
        Ok(true)
    }

    async fn flush(&self) -> Result<bool> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        debug!("[Moka] Flushed all entries");
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "Moka"
    }
}
