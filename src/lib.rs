//! Eager Cache
//!
//! A small cache abstraction with a uniform backend contract and three
//! front-ends on top of it:
//!
//! - **Backends**: in-process (`DashMap`, Moka), file per key, Redis, no-op,
//!   plus composition (chained tiers, default TTL, key prefix) and a
//!   factory building any of them from JSON options
//! - **`TransientCache`**: request-scoped, accepts shared object handles
//! - **`PersistentCache`**: validated, namespaced keys with lifetimes
//! - **`AggregatedCache`**: many logical keys in one physical entry,
//!   loaded once and persisted at most once per scope
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use eager_cache::{AggregatedCache, BackendFactory};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> eager_cache::Result<()> {
//!     let backend = BackendFactory::new()
//!         .build_backend("file", &json!({"directory": "/tmp/eager-cache"}))
//!         .await?;
//!
//!     // One fetch for every key used during this request
//!     let mut cache = AggregatedCache::new(backend, "eagercache").await?;
//!
//!     if !cache.contains("plugins") {
//!         cache.set("plugins", json!(["Goals", "Ecommerce"]))?;
//!     }
//!
//!     // At most one save, and only if something changed
//!     cache.persist_if_needed(Duration::from_secs(43_200)).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! AggregatedCache ─┐
//! TransientCache  ─┼─→ Arc<dyn CacheBackend> ─→ Memory | Moka | File | Redis | Null
//! PersistentCache ─┘                            Chained | DefaultTtl | KeyPrefix
//! ```

pub mod aggregated;
pub mod backends;
pub mod codecs;
pub mod error;
pub mod factory;
pub mod persistent;
pub mod traits;
pub mod transient;
pub mod value;

pub use aggregated::{AggregatedCache, PersistOutcome, ReusableAggregatedCache};
pub use backends::{
    ChainedCache, DefaultTtlCache, FileCache, KeyPrefixCache, MemoryCache, NullCache,
};
pub use error::{CacheError, Result};
pub use factory::{BackendFactory, FileOptions, RedisOptions};
pub use persistent::PersistentCache;
pub use traits::{CacheBackend, CacheCodec};
pub use transient::TransientCache;
pub use value::{CacheValue, ObjectHandle};

#[cfg(feature = "moka")]
pub use backends::{MokaCache, MokaCacheConfig};
#[cfg(feature = "redis")]
pub use backends::RedisCache;

// Re-export async_trait for user convenience
pub use async_trait::async_trait;
