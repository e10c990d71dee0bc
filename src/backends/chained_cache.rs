//! Chained Cache - Ordered Backend Tiers
//!
//! Combines several backends, fastest first. Reads walk the tiers in
//! order and promote a hit into every faster tier; writes go to all tiers.
//!
//! ```text
//! fetch → Tier 0 (Memory) → Tier 1 (File) → Tier 2 (Redis)
//!         ↓ Hit            ↓ Hit            ↓ Hit
//!         Return           Back-fill 0      Back-fill 0, 1
//! ```

use crate::traits::CacheBackend;
use crate::value::CacheValue;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backend composed of ordered tiers
pub struct ChainedCache {
    tiers: Vec<Arc<dyn CacheBackend>>,
}

impl ChainedCache {
    /// Create a chain from backends ordered fastest first
    #[must_use]
    pub fn new(tiers: Vec<Arc<dyn CacheBackend>>) -> Self {
        info!(
            tiers = tiers.len(),
            names = ?tiers.iter().map(|tier| tier.name()).collect::<Vec<_>>(),
            "Initializing Chained Cache"
        );
        Self { tiers }
    }

    /// The tiers of this chain, fastest first
    #[must_use]
    pub fn backends(&self) -> &[Arc<dyn CacheBackend>] {
        &self.tiers
    }
}

#[async_trait]
impl CacheBackend for ChainedCache {
    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        for (index, tier) in self.tiers.iter().enumerate() {
            let Some(value) = tier.fetch(key).await? else {
                continue;
            };

            // Promote into the faster tiers only; slower ones stay untouched
            for faster in self.tiers.iter().take(index) {
                match faster.save(key, value.clone(), Duration::ZERO).await {
                    Ok(_) => debug!(key = %key, from = tier.name(), to = faster.name(), "[Chained] Promoted key"),
                    Err(error) => {
                        warn!(key = %key, tier = faster.name(), error = %error, "[Chained] Failed to promote key");
                    }
                }
            }
            return Ok(Some(value));
        }
        Ok(None)
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        for tier in &self.tiers {
            if tier.contains(key).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn save(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<bool> {
        let mut stored = true;
        for tier in &self.tiers {
            stored &= tier.save(key, value.clone(), ttl).await?;
        }
        Ok(stored)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut deleted = true;
        for tier in &self.tiers {
            deleted &= tier.delete(key).await?;
        }
        Ok(deleted)
    }

    async fn flush(&self) -> Result<bool> {
        let mut flushed = true;
        for tier in &self.tiers {
            flushed &= tier.flush().await?;
        }
        Ok(flushed)
    }

    fn name(&self) -> &'static str {
        "Chained"
    }
}
