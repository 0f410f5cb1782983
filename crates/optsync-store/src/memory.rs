//! In-memory storage area
//!
//! Concurrent map standing in for the synchronized browser storage area,
//! with optional quotas that follow the same accounting rules.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::backend::{entry_size, StorageBackend, StorageEntry};
use crate::error::{BackendError, BackendResult};

/// Quota limits for a storage area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Maximum bytes for one key/value pair
    pub per_item_bytes: usize,
    /// Maximum bytes for the whole area
    pub total_bytes: usize,
}

impl Quota {
    /// Limits of the synchronized browser storage area
    pub const SYNC: Self = Self {
        per_item_bytes: 8_192,
        total_bytes: 102_400,
    };
}

/// In-memory backend
///
/// Clones share the same area, so several engines can be pointed at one
/// store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    area: Arc<DashMap<String, JsonValue>>,
    quota: Option<Quota>,
    // held across quota check and insert
    write_lock: Arc<Mutex<()>>,
}

impl MemoryBackend {
    /// Create unlimited area
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create area with the synchronized-storage quotas
    #[inline]
    #[must_use]
    pub fn sync_quota() -> Self {
        Self::with_quota(Quota::SYNC)
    }

    /// Create area with custom quotas
    #[inline]
    #[must_use]
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            area: Arc::new(DashMap::new()),
            quota: Some(quota),
            write_lock: Arc::default(),
        }
    }

    /// Seed a raw value, bypassing quotas
    pub fn insert_raw(&self, key: impl Into<String>, value: JsonValue) {
        self.area.insert(key.into(), value);
    }

    /// Read a raw value
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<JsonValue> {
        self.area.get(key).map(|v| v.value().clone())
    }

    /// Number of stored keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.area.len()
    }

    /// Check if area is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.area.is_empty()
    }

    /// Bytes in use under the quota accounting rules
    #[must_use]
    pub fn bytes_in_use(&self) -> usize {
        self.area
            .iter()
            .map(|item| entry_size(item.key(), item.value()))
            .sum()
    }

    /// Remove everything
    pub fn clear(&self) {
        self.area.clear();
    }

    fn check_quota(&self, entry: &StorageEntry) -> BackendResult<()> {
        let Some(quota) = self.quota else {
            return Ok(());
        };

        let mut incoming = 0;
        for (key, value) in entry {
            let bytes = entry_size(key, value);
            if bytes > quota.per_item_bytes {
                return Err(BackendError::QuotaExceeded {
                    key: key.clone(),
                    bytes,
                    limit: quota.per_item_bytes,
                });
            }
            incoming += bytes;
        }

        let retained: usize = self
            .area
            .iter()
            .filter(|item| !entry.contains_key(item.key()))
            .map(|item| entry_size(item.key(), item.value()))
            .sum();

        let total = retained + incoming;
        if total > quota.total_bytes {
            let key = entry.keys().next().cloned().unwrap_or_default();
            return Err(BackendError::QuotaExceeded {
                key,
                bytes: total,
                limit: quota.total_bytes,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> BackendResult<StorageEntry> {
        let mut wrapper = StorageEntry::new();
        if let Some(value) = self.raw(key) {
            wrapper.insert(key.to_string(), value);
        }
        Ok(wrapper)
    }

    async fn set(&self, entry: StorageEntry) -> BackendResult<()> {
        let _guard = self.write_lock.lock();
        self.check_quota(&entry)?;
        for (key, value) in entry {
            self.area.insert(key, value);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
