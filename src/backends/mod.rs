//! Cache Backend Implementations
//!
//! # Available Backends
//!
//! ## In-Memory
//! - **`MemoryCache`** - Unbounded concurrent `HashMap` (`DashMap`), keeps object handles
//! - **`MokaCache`** - Capacity-bounded with automatic eviction (feature: `moka`)
//!
//! ## Persistent
//! - **`FileCache`** - One file per key below a directory
//! - **`RedisCache`** - Shared between processes (feature: `redis`)
//!
//! ## Special
//! - **`NullCache`** - Stores nothing, every read misses
//!
//! ## Composition
//! - **`ChainedCache`** - Ordered tiers with promotion into faster tiers
//! - **`DefaultTtlCache`** - Default TTL for saves without one
//! - **`KeyPrefixCache`** - Namespaces every key
//!
//! # TTL rules
//!
//! - `Duration::ZERO` never expires.
//! - A TTL longer than [`MAX_TTL`] never expires either.
//! - Backends with second granularity (file, Redis) round a sub-second
//!   remainder up, so `1.2s` lives two seconds and `200ms` one.
//!
//! # Usage
//!
//! ```rust,no_run
//! use eager_cache::backends::{ChainedCache, FileCache, MemoryCache};
//! use eager_cache::CacheBackend;
//! use std::sync::Arc;
//!
//! let memory: Arc<dyn CacheBackend> = Arc::new(MemoryCache::new());
//! let file: Arc<dyn CacheBackend> = Arc::new(FileCache::new("/var/cache/app"));
//! let chained = ChainedCache::new(vec![memory, file]);
//! ```

pub mod chained_cache;
pub mod decorators;
pub mod file_cache;
pub mod memory_cache;
pub mod null_cache;

#[cfg(feature = "moka")]
pub mod moka_cache;
#[cfg(feature = "redis")]
pub mod redis_cache;

pub use chained_cache::ChainedCache;
pub use decorators::{DefaultTtlCache, KeyPrefixCache};
pub use file_cache::FileCache;
pub use memory_cache::{MemoryCache, MemoryCacheStats};
pub use null_cache::NullCache;

#[cfg(feature = "moka")]
pub use moka_cache::{MokaCache, MokaCacheConfig};
#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;

use std::time::Duration;

/// Longest TTL honoured as an expiry (100 years)
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// The TTL to enforce, `None` when the entry never expires
pub(crate) fn effective_ttl(ttl: Duration) -> Option<Duration> {
    (!ttl.is_zero() && ttl <= MAX_TTL).then_some(ttl)
}

/// Whole seconds of `ttl`, sub-second remainder rounded up
pub(crate) fn whole_secs(ttl: Duration) -> u64 {
    ttl.as_secs()
        .saturating_add(u64::from(ttl.subsec_nanos() > 0))
}
