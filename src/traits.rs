//! Cache Backend Traits
//!
//! This module defines the trait abstractions shared by every storage
//! implementation and every serialization codec.
//!
//! # Architecture
//!
//! - `CacheCodec`: Trait for pluggable serialization of plain data
//! - `CacheBackend`: The five-operation contract all backends satisfy
//!
//! # Example: Custom Backend
//!
//! ```rust,ignore
//! use eager_cache::{CacheBackend, CacheValue, async_trait};
//! use std::time::Duration;
//! use anyhow::Result;
//!
//! struct MyCustomCache {
//!     // Your implementation
//! }
//!
//! #[async_trait]
//! impl CacheBackend for MyCustomCache {
//!     async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
//!         // Your implementation
//!     }
//!
//!     async fn contains(&self, key: &str) -> Result<bool> {
//!         // Your implementation
//!     }
//!
//!     async fn save(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<bool> {
//!         // Your implementation
//!     }
//!
//!     async fn delete(&self, key: &str) -> Result<bool> {
//!         // Your implementation
//!     }
//!
//!     async fn flush(&self) -> Result<bool> {
//!         // Your implementation
//!     }
//! }
//! ```

use crate::value::CacheValue;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;

/// Trait for cache value serialization/deserialization
///
/// Serializing backends (file, Redis) encode plain data through a codec.
/// Object handles never reach a codec.
///
/// # Example: Custom Codec
///
/// ```rust,ignore
/// use eager_cache::CacheCodec;
/// use anyhow::Result;
/// use serde::{Serialize, de::DeserializeOwned};
///
/// #[derive(Debug, Default)]
/// struct MyCustomCodec;
///
/// impl CacheCodec for MyCustomCodec {
///     fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
///         Ok(mycodec::serialize(value)?)
///     }
///
///     fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
///         Ok(mycodec::deserialize(bytes)?)
///     }
///
///     fn name(&self) -> &'static str {
///         "mycodec"
///     }
/// }
/// ```
pub trait CacheCodec: Send + Sync + Debug {
    /// Serialize a value to bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented by this codec.
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize bytes to a value
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid encoding.
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;

    /// Get the name of the codec, used for logging
    fn name(&self) -> &'static str;
}

/// Storage backend contract
///
/// Every backend (in-memory, file, Redis, no-op, and the decorators
/// wrapping them) exposes the same operations, so the front-end caches
/// never depend on how a value is persisted.
///
/// # Semantics
///
/// - Absence is not an error: `fetch` returns `Ok(None)`.
/// - A zero `ttl` means "no expiry" (or the backend's default).
/// - `delete` succeeds for keys that do not exist.
/// - `Err` is reserved for transport and I/O failures.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; they are shared as
/// `Arc<dyn CacheBackend>`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the value stored under `key`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(value))` - Value found
    /// * `Ok(None)` - Key not found or expired
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Check whether a live entry exists for `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn contains(&self, key: &str) -> Result<bool>;

    /// Store `value` under `key`
    ///
    /// # Arguments
    ///
    /// * `key` - The cache key
    /// * `value` - The value to store
    /// * `ttl` - Time-to-live, `Duration::ZERO` for no expiry
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the entry was stored, `Ok(false)` if the backend
    /// declined it.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be stored by this backend or
    /// the backend cannot be reached.
    async fn save(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<bool>;

    /// Remove the entry stored under `key`
    ///
    /// Returns `Ok(true)` even if the key did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every entry managed by this backend
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn flush(&self) -> Result<bool>;

    /// Get the name of this cache backend
    ///
    /// Used for logging and for introspecting factory-built backends.
    fn name(&self) -> &'static str {
        "unknown"
    }
}
