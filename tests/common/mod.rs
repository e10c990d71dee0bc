//! Common utilities for integration tests
//!
//! - Recording and failing backends to observe what the caches send
//! - Unique key helpers
//! - Tracing setup

#![allow(dead_code)]

use anyhow::{Result, bail};
use eager_cache::{CacheBackend, CacheValue, MemoryCache, async_trait};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

/// Install a tracing subscriber once per test binary
///
/// Controlled by `RUST_LOG`, silent by default.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Create a test key with a random suffix
pub fn test_key(name: &str) -> String {
    format!("test_{}_{}", name, rand::random::<u32>())
}

/// A save observed by [`RecordingBackend`]
#[derive(Debug, Clone)]
pub struct RecordedSave {
    pub key: String,
    pub value: CacheValue,
    pub ttl: Duration,
}

/// Memory backend that records every write it receives
pub struct RecordingBackend {
    inner: MemoryCache,
    saves: Mutex<Vec<RecordedSave>>,
    deletes: Mutex<Vec<String>>,
    fetches: AtomicUsize,
    reject_saves: AtomicBool,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        init_tracing();
        Arc::new(Self {
            inner: MemoryCache::new(),
            saves: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            reject_saves: AtomicBool::new(false),
        })
    }

    /// Backend pre-loaded with `value` under `key`
    pub async fn with_entry(key: &str, value: serde_json::Value) -> Arc<Self> {
        let backend = Self::new();
        backend
            .inner
            .save(key, CacheValue::Data(value), Duration::ZERO)
            .await
            .unwrap();
        backend
    }

    /// Make `save` answer `false` without storing anything
    pub fn reject_saves(&self) {
        self.reject_saves.store(true, Ordering::SeqCst);
    }

    pub fn saves(&self) -> Vec<RecordedSave> {
        self.saves.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Plain data currently stored under `key`, bypassing the recorder
    pub async fn stored(&self, key: &str) -> Option<serde_json::Value> {
        self.inner
            .fetch(key)
            .await
            .unwrap()
            .and_then(CacheValue::into_data)
    }

    pub fn as_backend(self: &Arc<Self>) -> Arc<dyn CacheBackend> {
        Arc::clone(self) as Arc<dyn CacheBackend>
    }
}

#[async_trait]
impl CacheBackend for RecordingBackend {
    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(key).await
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        self.inner.contains(key).await
    }

    async fn save(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<bool> {
        self.saves.lock().unwrap().push(RecordedSave {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        });
        if self.reject_saves.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.save(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.deletes.lock().unwrap().push(key.to_string());
        self.inner.delete(key).await
    }

    async fn flush(&self) -> Result<bool> {
        self.inner.flush().await
    }

    fn name(&self) -> &'static str {
        "Recording"
    }
}

/// Backend whose writes fail with a transport error
///
/// Reads behave like an empty store.
#[derive(Debug, Default)]
pub struct FailingBackend;

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn fetch(&self, _key: &str) -> Result<Option<CacheValue>> {
        Ok(None)
    }

    async fn contains(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    async fn save(&self, _key: &str, _value: CacheValue, _ttl: Duration) -> Result<bool> {
        bail!("connection reset by peer")
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        bail!("connection reset by peer")
    }

    async fn flush(&self) -> Result<bool> {
        bail!("connection reset by peer")
    }

    fn name(&self) -> &'static str {
        "Failing"
    }
}
