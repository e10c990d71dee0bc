//! Backend Decorators
//!
//! Thin forwarding wrappers that adjust keys or TTLs before handing the
//! call to the wrapped backend.

use crate::traits::CacheBackend;
use crate::value::CacheValue;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Applies a default TTL to saves that do not specify one
pub struct DefaultTtlCache {
    inner: Arc<dyn CacheBackend>,
    default_ttl: Duration,
}

impl DefaultTtlCache {
    #[must_use]
    pub fn new(inner: Arc<dyn CacheBackend>, default_ttl: Duration) -> Self {
        Self { inner, default_ttl }
    }

    /// The wrapped backend
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn CacheBackend> {
        &self.inner
    }

    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

#[async_trait]
impl CacheBackend for DefaultTtlCache {
    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        self.inner.fetch(key).await
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        self.inner.contains(key).await
    }

    async fn save(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<bool> {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        self.inner.save(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(key).await
    }

    async fn flush(&self) -> Result<bool> {
        self.inner.flush().await
    }

    fn name(&self) -> &'static str {
        "DefaultTtl"
    }
}

/// Prefixes every key before forwarding
///
/// `flush` is forwarded unchanged and clears the whole wrapped backend,
/// including keys outside the prefix.
pub struct KeyPrefixCache {
    inner: Arc<dyn CacheBackend>,
    prefix: String,
}

impl KeyPrefixCache {
    pub fn new(inner: Arc<dyn CacheBackend>, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    /// The wrapped backend
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn CacheBackend> {
        &self.inner
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

#[async_trait]
impl CacheBackend for KeyPrefixCache {
    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        self.inner.fetch(&self.prefixed(key)).await
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        self.inner.contains(&self.prefixed(key)).await
    }

    async fn save(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<bool> {
        self.inner.save(&self.prefixed(key), value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(&self.prefixed(key)).await
    }

    async fn flush(&self) -> Result<bool> {
        self.inner.flush().await
    }

    fn name(&self) -> &'static str {
        "KeyPrefix"
    }
}
