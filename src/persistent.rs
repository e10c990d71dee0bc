//! Persistent Cache
//!
//! Forwards to a backend with validated, namespaced keys. Keys must start
//! with a letter or digit and may then contain letters, digits, `_`, `.`
//! and `-`; this keeps them safe as file names (no `.htaccess`, no path
//! separators, no spaces).

use crate::error::{CacheError, Result};
use crate::traits::CacheBackend;
use crate::value::CacheValue;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

/// Namespace prepended to every key by default
pub const DEFAULT_KEY_PREFIX: &str = "persistentcache_";

#[allow(clippy::expect_used)]
static VALID_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.\-]*$").expect("Invalid cache key regex"));

/// Check a key against the accepted format
///
/// # Errors
///
/// Returns [`CacheError::EmptyKey`] or [`CacheError::InvalidKey`].
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::EmptyKey);
    }
    if !VALID_KEY.is_match(key) {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Cache with key validation and per-entry lifetimes
///
/// Only plain data is accepted; object handles are rejected because
/// persistent backends cannot serialize them.
#[derive(Clone)]
pub struct PersistentCache {
    backend: Arc<dyn CacheBackend>,
    prefix: String,
}

impl PersistentCache {
    /// Create a persistent cache using [`DEFAULT_KEY_PREFIX`]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_prefix(backend, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(backend: Arc<dyn CacheBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    fn backend_key(&self, key: &str) -> Result<String> {
        validate_key(key)?;
        Ok(format!("{}{key}", self.prefix))
    }

    /// Fetch an entry, `None` if there is none
    ///
    /// # Errors
    ///
    /// Returns a key validation error or [`CacheError::Backend`].
    pub async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let key = self.backend_key(key)?;
        Ok(self.backend.fetch(&key).await?)
    }

    /// # Errors
    ///
    /// Returns a key validation error or [`CacheError::Backend`].
    pub async fn has(&self, key: &str) -> Result<bool> {
        let key = self.backend_key(key)?;
        Ok(self.backend.contains(&key).await?)
    }

    /// Store `value`; a zero `ttl` keeps it forever
    ///
    /// # Errors
    ///
    /// Returns a key validation error, [`CacheError::InvalidValue`] for
    /// object handles, or [`CacheError::Backend`].
    pub async fn set(&self, key: &str, value: impl Into<CacheValue>, ttl: Duration) -> Result<bool> {
        let key = self.backend_key(key)?;
        let value = value.into();
        if value.is_object() {
            return Err(CacheError::InvalidValue("a persistent cache".to_string()));
        }
        Ok(self.backend.save(&key, value, ttl).await?)
    }

    /// # Errors
    ///
    /// Returns a key validation error or [`CacheError::Backend`].
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let key = self.backend_key(key)?;
        Ok(self.backend.delete(&key).await?)
    }

    /// Flush the whole backend
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] on backend failure.
    pub async fn flush_all(&self) -> Result<bool> {
        Ok(self.backend.flush().await?)
    }
}
