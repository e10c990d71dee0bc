//! Cache Errors
//!
//! Public error taxonomy of the front-end caches and the backend factory.
//! Backend transport failures arrive as `anyhow::Error` and are wrapped
//! transparently in [`CacheError::Backend`].

use thiserror::Error;

/// Errors raised by the caches and the backend factory
///
/// Absence of a key is never an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    /// An object handle was given where only plain data is accepted
    #[error("You cannot cache an object in {0}, only maps, lists, strings and numbers. Use a transient cache instead.")]
    InvalidValue(String),

    /// A reusable aggregated cache was used before it was bound to a backend
    #[error("Cache was not populated. Make sure to call populate() first")]
    NotPopulated,

    /// Empty key given to a validating cache
    #[error("Empty cache id given")]
    EmptyKey,

    /// Key with characters outside the accepted set
    #[error("Invalid cache id requested: {0}")]
    InvalidKey(String),

    /// Unknown backend type requested from the factory
    #[error("Cache backend {0} not valid")]
    BackendNotFound(String),

    /// Backend options are missing or malformed
    #[error("Backend misconfigured: {0}")]
    Misconfigured(String),

    /// Failure reported by a storage backend
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Convenience alias for results of cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
