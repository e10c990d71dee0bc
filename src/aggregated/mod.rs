//! Aggregated Caches
//!
//! An aggregated cache keeps many logical keys in a single physical
//! backend entry. Instead of reading a hundred small entries per request,
//! the whole map is loaded with one `fetch`, read and mutated in memory,
//! and written back with at most one `save` at the end of the scope.
//!
//! Use it only for small entries needed on nearly every request; the
//! whole map is decoded on every load.
//!
//! Two variants share the same in-memory semantics:
//!
//! - [`AggregatedCache`]: bound to a backend and storage key at construction.
//! - [`ReusableAggregatedCache`]: constructed empty, then populated (and
//!   re-populated) for successive scopes of a long-lived process.
//!
//! # Values
//!
//! Only plain data (`serde_json::Value`) can be stored. Object handles
//! are rejected with [`CacheError::InvalidValue`]. The check looks at the
//! top-level value only; plain data cannot embed handles, so nested
//! values need no scan.
//!
//! # Concurrency
//!
//! Instances are single-owner: mutation takes `&mut self`. Two instances
//! bound to the same storage key do not coordinate; the last persist wins.

mod eager;
mod reusable;

pub use eager::AggregatedCache;
pub use reusable::ReusableAggregatedCache;

use crate::error::{CacheError, Result};
use crate::traits::CacheBackend;
use crate::value::CacheValue;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Result of a `persist_if_needed` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Nothing changed since load, the backend was not called
    Clean,
    /// The content was saved
    Saved,
    /// The backend was called but reported that it did not store the entry
    Rejected,
}

/// In-memory map plus dirty tracking, shared by both variants
#[derive(Debug, Default)]
pub(crate) struct Content {
    entries: Map<String, Value>,
    dirty: bool,
}

impl Content {
    /// Load the map stored under `storage_key`
    ///
    /// Anything but a stored map (absent, scalar, list, object handle)
    /// starts empty.
    pub(crate) async fn load(backend: &dyn CacheBackend, storage_key: &str) -> Result<Self> {
        let entries = match backend.fetch(storage_key).await? {
            Some(CacheValue::Data(Value::Object(map))) => map,
            _ => Map::new(),
        };
        debug!(
            storage_key = %storage_key,
            backend = backend.name(),
            entries = entries.len(),
            "[Aggregated] Loaded content"
        );
        Ok(Self {
            entries,
            dirty: false,
        })
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn set(&mut self, key: String, value: CacheValue) -> Result<bool> {
        let CacheValue::Data(value) = value else {
            return Err(CacheError::InvalidValue("an aggregated cache".to_string()));
        };
        self.entries.insert(key, value);
        self.dirty = true;
        Ok(true)
    }

    pub(crate) fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.dirty = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.dirty = false;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Save the whole map if anything changed since load
    ///
    /// `dirty` resets once the backend answered, whatever it answered. A
    /// backend error leaves it set so the caller can retry.
    pub(crate) async fn persist(
        &mut self,
        backend: &dyn CacheBackend,
        storage_key: &str,
        ttl: Duration,
    ) -> Result<PersistOutcome> {
        if !self.dirty {
            return Ok(PersistOutcome::Clean);
        }

        let snapshot = CacheValue::Data(Value::Object(self.entries.clone()));
        let stored = backend.save(storage_key, snapshot, ttl).await?;
        self.dirty = false;

        debug!(
            storage_key = %storage_key,
            entries = self.entries.len(),
            ttl_secs = ttl.as_secs(),
            stored,
            "[Aggregated] Persisted content"
        );

        Ok(if stored {
            PersistOutcome::Saved
        } else {
            PersistOutcome::Rejected
        })
    }
}
