use super::{Content, PersistOutcome};
use crate::error::{CacheError, Result};
use crate::traits::CacheBackend;
use crate::value::CacheValue;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Backend and storage key a reusable cache is currently bound to
struct Binding {
    backend: Arc<dyn CacheBackend>,
    storage_key: String,
}

/// Aggregated cache that can be re-bound for successive scopes
///
/// Starts unpopulated. [`populate`](Self::populate) binds it to a backend
/// and storage key and loads the stored map; calling it again re-binds,
/// for example once per request in a long-lived worker.
///
/// Re-populating discards the in-memory state unconditionally. Mutations
/// not persisted before that are lost.
///
/// # Example
///
/// ```rust,no_run
/// use eager_cache::{CacheBackend, ReusableAggregatedCache};
/// use eager_cache::backends::MemoryCache;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> eager_cache::Result<()> {
/// let backend: Arc<dyn CacheBackend> = Arc::new(MemoryCache::new());
/// let mut cache = ReusableAggregatedCache::new();
///
/// if !cache.is_populated() {
///     cache.populate(backend, "multicache").await?;
///     cache.set("myid", "test")?;
///
///     // ... at the end of the request
///     cache.persist_if_needed(Duration::from_secs(43_200)).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ReusableAggregatedCache {
    binding: Option<Binding>,
    content: Content,
}

impl ReusableAggregatedCache {
    /// Create an unpopulated cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to `backend` and load the map stored under `storage_key`
    ///
    /// Any previous binding and in-memory content are replaced, dirty or not.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] if the backend fails to fetch; the
    /// previous binding and content are kept in that case.
    pub async fn populate(
        &mut self,
        backend: Arc<dyn CacheBackend>,
        storage_key: impl Into<String>,
    ) -> Result<()> {
        let storage_key = storage_key.into();
        let content = Content::load(backend.as_ref(), &storage_key).await?;

        if let Some(previous) = self.binding.as_ref().filter(|_| self.content.is_dirty()) {
            warn!(
                storage_key = %previous.storage_key,
                entries = self.content.len(),
                "[Aggregated] Re-populating discards unpersisted changes"
            );
        }

        self.content = content;
        self.binding = Some(Binding {
            backend,
            storage_key,
        });
        Ok(())
    }

    /// Whether the cache is bound to a backend and storage key
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.binding.is_some()
    }

    /// Value stored under `key`, `None` if there is none
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotPopulated`] before [`populate`](Self::populate).
    pub fn get(&self, key: &str) -> Result<Option<&Value>> {
        self.ensure_populated()?;
        Ok(self.content.get(key))
    }

    /// Whether `key` is present in the populated content
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotPopulated`] before [`populate`](Self::populate).
    pub fn contains(&self, key: &str) -> Result<bool> {
        self.ensure_populated()?;
        Ok(self.content.contains(key))
    }

    /// Set (overwrite) the value of `key` and mark the cache dirty
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotPopulated`] before [`populate`](Self::populate)
    /// and [`CacheError::InvalidValue`] for object handles.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<CacheValue>) -> Result<bool> {
        self.ensure_populated()?;
        self.content.set(key.into(), value.into())
    }

    /// Remove `key`, returning `false` if it was not present
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotPopulated`] before [`populate`](Self::populate).
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        self.ensure_populated()?;
        Ok(self.content.delete(key))
    }

    /// Drop every key; when populated also delete the physical entry
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] if the backend fails to delete.
    pub async fn flush_all(&mut self) -> Result<bool> {
        if let Some(binding) = &self.binding {
            binding.backend.delete(&binding.storage_key).await?;
            debug!(storage_key = %binding.storage_key, "[Aggregated] Flushed content");
        }
        self.content.clear();
        Ok(true)
    }

    /// Write the map back with `ttl` if it changed since load or last persist
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotPopulated`] before [`populate`](Self::populate)
    /// and [`CacheError::Backend`] if the backend fails to save.
    pub async fn persist_if_needed(&mut self, ttl: Duration) -> Result<PersistOutcome> {
        let binding = self.binding.as_ref().ok_or(CacheError::NotPopulated)?;
        self.content
            .persist(binding.backend.as_ref(), &binding.storage_key, ttl)
            .await
    }

    /// Storage key of the current binding
    #[must_use]
    pub fn storage_key(&self) -> Option<&str> {
        self.binding
            .as_ref()
            .map(|binding| binding.storage_key.as_str())
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.content.is_dirty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.len() == 0
    }

    fn ensure_populated(&self) -> Result<()> {
        if self.is_populated() {
            Ok(())
        } else {
            Err(CacheError::NotPopulated)
        }
    }
}
