//! Redis Cache - Distributed Cache Backend
//!
//! Redis-based backend for data shared between processes, with persistence.

use super::{effective_ttl, whole_secs};
use crate::codecs::JsonCodec;
use crate::traits::CacheCodec;
use crate::value::CacheValue;
use anyhow::{Context, Result, bail};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Default Redis URL when `REDIS_URL` is not set
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Redis backend with `ConnectionManager` for automatic reconnection
///
/// Values are encoded with the codec `C` (JSON by default). Object
/// handles cannot be stored.
///
/// `flush` issues `FLUSHDB` and therefore clears the whole selected
/// database, not only keys written through this backend.
pub struct RedisCache<C: CacheCodec = JsonCodec> {
    /// Redis connection manager - handles reconnection automatically
    conn_manager: ConnectionManager,
    codec: C,
}

impl RedisCache<JsonCodec> {
    /// Create new Redis cache from the `REDIS_URL` environment variable
    ///
    /// Default: `redis://127.0.0.1:6379`
    ///
    /// # Errors
    ///
    /// Returns an error if the Redis client cannot be created or connection fails.
    pub async fn new() -> Result<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
        Self::with_url(&redis_url).await
    }

    /// Create new Redis cache with custom URL
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection string (e.g., `<redis://localhost:6379>`)
    ///
    /// # Errors
    ///
    /// Returns an error if the Redis client cannot be created or connection fails.
    pub async fn with_url(redis_url: &str) -> Result<Self> {
        Self::connect(redis_url, JsonCodec, None).await
    }
}

impl<C: CacheCodec> RedisCache<C> {
    /// Create new Redis cache with a custom codec and optional connect timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the Redis client cannot be created, the
    /// connection fails, or the timeout elapses.
    pub async fn connect(redis_url: &str, codec: C, timeout: Option<Duration>) -> Result<Self> {
        info!(redis_url = %redis_url, codec = codec.name(), "Initializing Redis Cache with ConnectionManager");

        let client = Client::open(redis_url)
            .with_context(|| format!("Failed to create Redis client with URL: {redis_url}"))?;

        let conn_manager = match timeout {
            Some(limit) => tokio::time::timeout(limit, ConnectionManager::new(client))
                .await
                .with_context(|| format!("Timed out connecting to Redis after {limit:?}"))?,
            None => ConnectionManager::new(client).await,
        }
        .context("Failed to establish Redis connection manager")?;

        // Test connection
        let mut conn = conn_manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis PING health check failed")?;

        info!(redis_url = %redis_url, "Redis Cache connected successfully");

        Ok(Self {
            conn_manager,
            codec,
        })
    }

    /// Codec used to encode stored values
    pub fn codec(&self) -> &C {
        &self.codec
    }
}

// ===== Trait Implementations =====

use crate::traits::CacheBackend;
use async_trait::async_trait;

#[async_trait]
impl<C: CacheCodec> CacheBackend for RedisCache<C> {
    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut conn = self.conn_manager.clone();

        let bytes: Option<Vec<u8>> = conn.get(key).await?;
        let Some(bytes) = bytes else {
            return Ok(None);
        };

        // Undecodable payloads are treated like a miss
        match self.codec.deserialize::<Value>(&bytes) {
            Ok(value) => Ok(Some(CacheValue::Data(value))),
            Err(error) => {
                debug!(key = %key, error = %error, "[Redis] Ignoring undecodable entry");
                Ok(None)
            }
        }
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn_manager.clone();
        Ok(conn.exists(key).await?)
    }

    async fn save(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<bool> {
        let CacheValue::Data(data) = value else {
            bail!("Redis backend cannot store object handles (key: {key})");
        };
        let bytes = self.codec.serialize(&data)?;
        let mut conn = self.conn_manager.clone();

        match effective_ttl(ttl) {
            None => {
                let _: () = conn.set(key, bytes).await?;
            }
            Some(ttl) => {
                let _: () = conn.set_ex(key, bytes, whole_secs(ttl)).await?;
            }
        }
        debug!(key = %key, ttl_secs = %whole_secs(ttl), "[Redis] Cached key");
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn.del(key).await?;
        Ok(true)
    }

    async fn flush(&self) -> Result<bool> {
        let mut conn = self.conn_manager.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        debug!("[Redis] Flushed database");
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "Redis"
    }
}
