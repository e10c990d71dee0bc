//! Cache Values
//!
//! Everything a backend stores is a [`CacheValue`]: either plain data
//! (scalars, strings, lists and maps, modelled as [`serde_json::Value`])
//! or an opaque shared object handle.
//!
//! Plain data can be serialized by any backend. Object handles carry
//! identity: in-process backends hand back the very same `Arc`, while
//! serializing backends (file, Redis) refuse them.

use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared handle to an arbitrary in-process object
pub type ObjectHandle = Arc<dyn Any + Send + Sync>;

/// A value held by a cache backend
#[derive(Clone)]
pub enum CacheValue {
    /// Plain data: null, bool, number, string, list or string-keyed map
    Data(Value),
    /// Object with identity semantics, only storable in-process
    Object(ObjectHandle),
}

impl CacheValue {
    /// Wrap any `'static` object into a shared handle
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(Arc::new(value))
    }

    /// Returns `true` for object handles
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Borrow the plain data, if this is not an object handle
    #[must_use]
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            Self::Object(_) => None,
        }
    }

    /// Take the plain data, if this is not an object handle
    #[must_use]
    pub fn into_data(self) -> Option<Value> {
        match self {
            Self::Data(value) => Some(value),
            Self::Object(_) => None,
        }
    }

    /// Downcast an object handle to a concrete type
    #[must_use]
    pub fn downcast_object<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Object(handle) => Arc::clone(handle).downcast::<T>().ok(),
            Self::Data(_) => None,
        }
    }
}

impl fmt::Debug for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Plain data compares structurally, object handles by identity
impl PartialEq for CacheValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for CacheValue {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<ObjectHandle> for CacheValue {
    fn from(handle: ObjectHandle) -> Self {
        Self::Object(handle)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<u64> for CacheValue {
    fn from(value: u64) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<Vec<Value>> for CacheValue {
    fn from(value: Vec<Value>) -> Self {
        Self::Data(Value::Array(value))
    }
}

impl From<serde_json::Map<String, Value>> for CacheValue {
    fn from(value: serde_json::Map<String, Value>) -> Self {
        Self::Data(Value::Object(value))
    }
}
