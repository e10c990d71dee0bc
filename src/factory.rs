//! Backend Factory
//!
//! Builds backends from a type name and JSON options, so the storage
//! stack can be chosen in configuration rather than in code.
//!
//! # Backend types
//!
//! | type          | options                                                        |
//! |---------------|----------------------------------------------------------------|
//! | `memory`      | none                                                           |
//! | `moka`        | `max_capacity`, `time_to_live`, `time_to_idle` (seconds)       |
//! | `file`        | `directory`                                                    |
//! | `null`        | none                                                           |
//! | `redis`       | `host`, `port`, `timeout` (seconds), `password`, `database`    |
//! | `chained`     | `backends: [type, ...]`, plus `<type>: {options}` per tier     |
//! | `default_ttl` | `backend: type`, `<type>: {options}`, `default_ttl` (seconds)  |
//! | `key_prefix`  | `backend: type`, `<type>: {options}`, `key_prefix`             |
//!
//! # Example
//!
//! ```rust,no_run
//! use eager_cache::BackendFactory;
//! use serde_json::json;
//!
//! # async fn example() -> eager_cache::Result<()> {
//! let factory = BackendFactory::new();
//! let backend = factory
//!     .build_backend(
//!         "chained",
//!         &json!({
//!             "backends": ["memory", "file"],
//!             "file": {"directory": "/var/cache/app"}
//!         }),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::backends::{ChainedCache, DefaultTtlCache, FileCache, KeyPrefixCache, MemoryCache, NullCache};
use crate::error::{CacheError, Result};
use crate::traits::CacheBackend;
use futures_util::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[cfg(feature = "moka")]
use crate::backends::{MokaCache, MokaCacheConfig};
#[cfg(feature = "redis")]
use crate::backends::RedisCache;

/// Options of the `file` backend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    pub directory: Option<PathBuf>,
}

/// Options of the `redis` backend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedisOptions {
    pub host: Option<String>,
    /// Accepts a number or a numeric string
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: Option<u16>,
    /// Connect timeout in seconds, 0 for none
    pub timeout: Option<f64>,
    pub password: Option<String>,
    pub database: Option<i64>,
}

impl RedisOptions {
    /// Connection URL for these options
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Misconfigured`] if host or port is missing.
    pub fn url(&self) -> Result<String> {
        let (Some(host), Some(port)) = (self.host.as_deref().filter(|h| !h.is_empty()), self.port)
        else {
            return Err(CacheError::Misconfigured(
                "Redis backend is not configured. Please provide at least a host and a port".to_string(),
            ));
        };

        // Password goes into the userinfo part percent-encoded
        let auth = self
            .password
            .as_deref()
            .filter(|password| !password.is_empty())
            .map(|password| format!(":{}@", urlencoding::encode(password)))
            .unwrap_or_default();
        let database = self.database.map(|db| format!("/{db}")).unwrap_or_default();

        Ok(format!("redis://{auth}{host}:{port}{database}"))
    }

    /// Connect timeout, `None` when unset or zero
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.timeout
            .filter(|secs| *secs > 0.0)
            .map(Duration::from_secs_f64)
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Option::<Port>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Port::Number(port)) => Ok(Some(port)),
        Some(Port::Text(text)) if text.is_empty() => Ok(None),
        Some(Port::Text(text)) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Options shared by the decorator backends
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DecoratorOptions {
    backend: Option<String>,
    default_ttl: Option<u64>,
    key_prefix: Option<String>,
}

/// Options of the `chained` backend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ChainedOptions {
    backends: Vec<String>,
}

fn parse_options<T: DeserializeOwned + Default>(kind: &str, options: &Value) -> Result<T> {
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone())
        .map_err(|error| CacheError::Misconfigured(format!("invalid {kind} options: {error}")))
}

/// Options stored under the name of a nested backend type
fn nested_options<'a>(options: &'a Value, kind: &str) -> &'a Value {
    options.get(kind).unwrap_or(&Value::Null)
}

/// Builds backends from configuration
#[derive(Debug, Default, Clone, Copy)]
pub struct BackendFactory;

impl BackendFactory {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn build_memory_cache(&self) -> MemoryCache {
        MemoryCache::new()
    }

    #[must_use]
    pub fn build_null_cache(&self) -> NullCache {
        NullCache::new()
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Misconfigured`] if `directory` is missing.
    pub fn build_file_cache(&self, options: &Value) -> Result<FileCache> {
        let options: FileOptions = parse_options("file", options)?;
        let directory = options.directory.ok_or_else(|| {
            CacheError::Misconfigured("The file backend requires a directory option".to_string())
        })?;
        Ok(FileCache::new(directory))
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Misconfigured`] for malformed options.
    #[cfg(feature = "moka")]
    pub fn build_moka_cache(&self, options: &Value) -> Result<MokaCache> {
        let config: MokaCacheConfig = parse_options("moka", options)?;
        Ok(MokaCache::new(config))
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Misconfigured`] if host or port is missing and
    /// [`CacheError::Backend`] if the connection fails.
    #[cfg(feature = "redis")]
    pub async fn build_redis_cache(&self, options: &Value) -> Result<RedisCache> {
        let options: RedisOptions = parse_options("redis", options)?;
        let url = options.url()?;
        Ok(RedisCache::connect(&url, crate::codecs::JsonCodec, options.connect_timeout()).await?)
    }

    /// Build every tier listed in `backends`, in order
    ///
    /// # Errors
    ///
    /// Fails if any tier fails to build.
    pub fn build_chained_cache<'a>(&'a self, options: &'a Value) -> BoxFuture<'a, Result<ChainedCache>> {
        self.chained(options).boxed()
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Misconfigured`] if `default_ttl` or `backend`
    /// is missing, or the nested backend's error.
    pub fn build_default_ttl_cache<'a>(
        &'a self,
        options: &'a Value,
    ) -> BoxFuture<'a, Result<DefaultTtlCache>> {
        self.default_ttl(options).boxed()
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Misconfigured`] if `key_prefix` or `backend`
    /// is missing, or the nested backend's error.
    pub fn build_key_prefix_cache<'a>(
        &'a self,
        options: &'a Value,
    ) -> BoxFuture<'a, Result<KeyPrefixCache>> {
        self.key_prefix(options).boxed()
    }

    /// Build a backend of type `kind`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::BackendNotFound`] for unknown types (or types
    /// whose cargo feature is disabled) and the builder's error otherwise.
    pub fn build_backend<'a>(
        &'a self,
        kind: &'a str,
        options: &'a Value,
    ) -> BoxFuture<'a, Result<Arc<dyn CacheBackend>>> {
        self.backend(kind, options).boxed()
    }

    async fn backend(&self, kind: &str, options: &Value) -> Result<Arc<dyn CacheBackend>> {
        let backend: Arc<dyn CacheBackend> = match kind {
            "memory" => Arc::new(self.build_memory_cache()),
            "null" => Arc::new(self.build_null_cache()),
            "file" => Arc::new(self.build_file_cache(options)?),
            #[cfg(feature = "moka")]
            "moka" => Arc::new(self.build_moka_cache(options)?),
            #[cfg(feature = "redis")]
            "redis" => Arc::new(self.build_redis_cache(options).await?),
            "chained" => Arc::new(self.build_chained_cache(options).await?),
            "default_ttl" => Arc::new(self.build_default_ttl_cache(options).await?),
            "key_prefix" => Arc::new(self.build_key_prefix_cache(options).await?),
            other => return Err(CacheError::BackendNotFound(other.to_string())),
        };
        info!(kind = %kind, backend = backend.name(), "Built cache backend");
        Ok(backend)
    }

    async fn chained(&self, options: &Value) -> Result<ChainedCache> {
        let chained: ChainedOptions = parse_options("chained", options)?;
        let mut tiers = Vec::with_capacity(chained.backends.len());
        for kind in &chained.backends {
            tiers.push(self.build_backend(kind, nested_options(options, kind)).await?);
        }
        Ok(ChainedCache::new(tiers))
    }

    async fn default_ttl(&self, options: &Value) -> Result<DefaultTtlCache> {
        let decorator: DecoratorOptions = parse_options("default_ttl", options)?;
        let default_ttl = decorator.default_ttl.ok_or_else(|| {
            CacheError::Misconfigured(
                "The default_ttl option is required and must be an integer".to_string(),
            )
        })?;
        let inner = self.decorated(&decorator, options).await?;
        Ok(DefaultTtlCache::new(inner, Duration::from_secs(default_ttl)))
    }

    async fn key_prefix(&self, options: &Value) -> Result<KeyPrefixCache> {
        let decorator: DecoratorOptions = parse_options("key_prefix", options)?;
        let prefix = decorator.key_prefix.clone().ok_or_else(|| {
            CacheError::Misconfigured("The key_prefix option is required and must be a string".to_string())
        })?;
        let inner = self.decorated(&decorator, options).await?;
        Ok(KeyPrefixCache::new(inner, prefix))
    }

    async fn decorated(
        &self,
        decorator: &DecoratorOptions,
        options: &Value,
    ) -> Result<Arc<dyn CacheBackend>> {
        let kind = decorator.backend.as_deref().ok_or_else(|| {
            CacheError::Misconfigured("A decorator requires a backend option".to_string())
        })?;
        self.build_backend(kind, nested_options(options, kind)).await
    }
}
