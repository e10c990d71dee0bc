//! Transient Cache
//!
//! Request-scoped cache without key validation or lifetimes. Unlike the
//! other front-ends it accepts object handles, so it suits in-process
//! backends such as [`MemoryCache`].

use crate::backends::MemoryCache;
use crate::error::Result;
use crate::traits::CacheBackend;
use crate::value::CacheValue;
use std::sync::Arc;
use std::time::Duration;

/// Cache for data that lives no longer than the current scope
///
/// # Example
///
/// ```rust
/// use eager_cache::{CacheValue, TransientCache};
///
/// # async fn example() -> eager_cache::Result<()> {
/// let cache = TransientCache::in_memory();
/// cache.save("request_user", CacheValue::object(42_u32)).await?;
/// assert!(cache.contains("request_user").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TransientCache {
    backend: Arc<dyn CacheBackend>,
}

impl TransientCache {
    /// Create a transient cache over `backend`
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Create a transient cache over a fresh [`MemoryCache`]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    /// Fetch the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`](crate::CacheError::Backend) on backend failure.
    pub async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        Ok(self.backend.fetch(key).await?)
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Backend`](crate::CacheError::Backend) on backend failure.
    pub async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.backend.contains(key).await?)
    }

    /// Store any value, object handles included, without expiry
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`](crate::CacheError::Backend) on backend failure.
    pub async fn save(&self, key: &str, value: impl Into<CacheValue>) -> Result<bool> {
        Ok(self.backend.save(key, value.into(), Duration::ZERO).await?)
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Backend`](crate::CacheError::Backend) on backend failure.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.backend.delete(key).await?)
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Backend`](crate::CacheError::Backend) on backend failure.
    pub async fn flush_all(&self) -> Result<bool> {
        Ok(self.backend.flush().await?)
    }
}
