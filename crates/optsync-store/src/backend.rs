//! Storage backend contract
//!
//! The durable key-value area the settings live in. Mirrors the
//! synchronized browser storage API: reads return a wrapper object that
//! may or may not contain the requested key, writes replace whole entries.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use crate::error::BackendResult;

/// Wrapper object exchanged with a backend (`{key: value, ...}`)
pub type StorageEntry = Map<String, JsonValue>;

/// Asynchronous key-value backend
///
/// # Contract
/// - `get` resolves to a wrapper object; a missing key means "no stored
///   value", never an error
/// - `set` replaces the value of every key in `entry` wholesale
/// - Cross-device synchronization, if any, is the backend's concern
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch the wrapper object for `key`
    async fn get(&self, key: &str) -> BackendResult<StorageEntry>;

    /// Write every key of `entry`
    async fn set(&self, entry: StorageEntry) -> BackendResult<()>;

    /// Backend name (for diagnostics)
    fn name(&self) -> &'static str {
        "backend"
    }
}

/// Size a key/value pair occupies under the browser quota rules
///
/// Key length plus the length of the value's JSON serialization.
#[must_use]
pub fn entry_size(key: &str, value: &JsonValue) -> usize {
    key.len() + value.to_string().len()
}
