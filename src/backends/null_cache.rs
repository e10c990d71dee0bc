//! Null Cache - No-op Backend
//!
//! Accepts every write and never returns anything. Useful to disable
//! caching without touching calling code.

use crate::traits::CacheBackend;
use crate::value::CacheValue;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Backend that stores nothing
///
/// `save`, `delete` and `flush` pretend to succeed; `fetch` and
/// `contains` always miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl NullCache {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn fetch(&self, _key: &str) -> Result<Option<CacheValue>> {
        Ok(None)
    }

    async fn contains(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    async fn save(&self, _key: &str, _value: CacheValue, _ttl: Duration) -> Result<bool> {
        Ok(true)
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        Ok(true)
    }

    async fn flush(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "Null"
    }
}
