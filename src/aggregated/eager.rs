use super::{Content, PersistOutcome};
use crate::error::Result;
use crate::traits::CacheBackend;
use crate::value::CacheValue;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Aggregated cache bound to one backend entry for its whole life
///
/// # Example
///
/// ```rust,no_run
/// use eager_cache::{AggregatedCache, CacheBackend};
/// use eager_cache::backends::MemoryCache;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> eager_cache::Result<()> {
/// let backend: Arc<dyn CacheBackend> = Arc::new(MemoryCache::new());
/// let mut cache = AggregatedCache::new(backend, "eagercache").await?;
///
/// if !cache.contains("settings") {
///     cache.set("settings", serde_json::json!({"theme": "dark"}))?;
/// }
///
/// // ... at the end of the request
/// cache.persist_if_needed(Duration::from_secs(43_200)).await?;
/// # Ok(())
/// # }
/// ```
pub struct AggregatedCache {
    backend: Arc<dyn CacheBackend>,
    storage_key: String,
    content: Content,
}

impl AggregatedCache {
    /// Bind to `backend` and load the map stored under `storage_key`
    ///
    /// A missing entry is a normal starting state and yields an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`](crate::CacheError::Backend) if the
    /// backend fails to fetch.
    pub async fn new(backend: Arc<dyn CacheBackend>, storage_key: impl Into<String>) -> Result<Self> {
        let storage_key = storage_key.into();
        let content = Content::load(backend.as_ref(), &storage_key).await?;
        Ok(Self {
            backend,
            storage_key,
            content,
        })
    }

    /// Value stored under `key`, `None` if there is none
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }

    /// Whether `key` is present, including keys holding `null`
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.content.contains(key)
    }

    /// Set (overwrite) the value of `key` and mark the cache dirty
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidValue`](crate::CacheError::InvalidValue)
    /// for object handles; the cache is left unchanged.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<CacheValue>) -> Result<bool> {
        self.content.set(key.into(), value.into())
    }

    /// Remove `key`
    ///
    /// Returns `false` (and stays clean) if the key was not present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.content.delete(key)
    }

    /// Drop every key and delete the physical entry from the backend
    ///
    /// The backend delete is issued whether or not anything was stored.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`](crate::CacheError::Backend) if the
    /// backend fails to delete.
    pub async fn flush_all(&mut self) -> Result<bool> {
        self.backend.delete(&self.storage_key).await?;
        self.content.clear();
        debug!(storage_key = %self.storage_key, "[Aggregated] Flushed content");
        Ok(true)
    }

    /// Write the map back with `ttl` if it changed since load or last persist
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`](crate::CacheError::Backend) if the
    /// backend fails to save; the cache stays dirty.
    pub async fn persist_if_needed(&mut self, ttl: Duration) -> Result<PersistOutcome> {
        self.content
            .persist(self.backend.as_ref(), &self.storage_key, ttl)
            .await
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.content.is_dirty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.len() == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.content.keys()
    }
}
