//! Settings Store Accessor
//!
//! Binds a backend to one storage namespace. Exactly one backend call per
//! `read` / `write`; no batching, debouncing or retries.

use optsync_core::{json_kind, SettingsObject};
use std::fmt;
use std::sync::Arc;

use crate::backend::{StorageBackend, StorageEntry};
use crate::error::BackendResult;

/// Namespaced view of a storage backend
#[derive(Clone)]
pub struct SettingsStore {
    backend: Arc<dyn StorageBackend>,
    namespace: Arc<str>,
}

impl SettingsStore {
    /// Create accessor for `namespace`
    pub fn new(backend: Arc<dyn StorageBackend>, namespace: impl Into<Arc<str>>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    /// Storage namespace owned by this accessor
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Underlying backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Fetch the stored settings object
    ///
    /// An absent key reads as `{}`. A stored value that is not an object is
    /// logged and also read as `{}`.
    ///
    /// # Errors
    /// Propagates backend failures unchanged
    pub async fn read(&self) -> BackendResult<SettingsObject> {
        let mut wrapper = self.backend.get(&self.namespace).await.map_err(|e| {
            tracing::error!(namespace = %self.namespace, backend = self.backend.name(), "Backend read failed: {}", e);
            e
        })?;

        let settings = match wrapper.remove(self.namespace.as_ref()) {
            None => SettingsObject::new(),
            Some(value) => {
                let kind = json_kind(&value);
                SettingsObject::try_from_value(value).unwrap_or_else(|| {
                    tracing::warn!(namespace = %self.namespace, found = kind, "Stored settings are not an object, reading as empty");
                    SettingsObject::new()
                })
            }
        };

        tracing::debug!(namespace = %self.namespace, keys = settings.len(), "Read stored settings");
        Ok(settings)
    }

    /// Replace the stored settings object wholesale
    ///
    /// # Errors
    /// Propagates backend failures unchanged (quota, unavailability)
    pub async fn write(&self, settings: SettingsObject) -> BackendResult<()> {
        let keys = settings.len();
        let mut entry = StorageEntry::new();
        entry.insert(self.namespace.to_string(), settings.into_value());

        self.backend.set(entry).await.map_err(|e| {
            tracing::error!(namespace = %self.namespace, backend = self.backend.name(), "Backend write failed: {}", e);
            e
        })?;

        tracing::debug!(namespace = %self.namespace, keys, "Wrote stored settings");
        Ok(())
    }
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore")
            .field("namespace", &self.namespace)
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockStorageBackend;
    use crate::error::BackendError;
    use crate::memory::MemoryBackend;
    use serde_json::json;

    fn wrapper(key: &str, value: serde_json::Value) -> StorageEntry {
        let mut map = StorageEntry::new();
        map.insert(key.to_string(), value);
        map
    }

    #[tokio::test]
    async fn read_absent_key_is_empty() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_get()
            .withf(|key| key.to_string() == "options")
            .times(1)
            .returning(|_| Ok(StorageEntry::new()));
        backend.expect_name().return_const("mock");

        let store = SettingsStore::new(Arc::new(backend), "options");
        assert!(store.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_unwraps_namespace() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_get()
            .times(1)
            .returning(|key| Ok(wrapper(key, json!({"size": 30}))));
        backend.expect_name().return_const("mock");

        let store = SettingsStore::new(Arc::new(backend), "settings");
        let settings = store.read().await.unwrap();
        assert_eq!(settings.into_value(), json!({"size": 30}));
    }

    #[tokio::test]
    async fn read_non_object_is_empty() {
        let backend = MemoryBackend::new();
        backend.insert_raw("options", json!("not an object"));

        let store = SettingsStore::new(Arc::new(backend), "options");
        assert!(store.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_wraps_under_namespace_once() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_set()
            .withf(|entry| entry.len() == 1 && entry.get("settings") == Some(&json!({"sound": false})))
            .times(1)
            .returning(|_| Ok(()));
        backend.expect_name().return_const("mock");

        let store = SettingsStore::new(Arc::new(backend), "settings");
        store
            .write(SettingsObject::from_value(json!({"sound": false})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn backend_failures_propagate() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_get()
            .returning(|_| Err(BackendError::unavailable("offline")));
        backend
            .expect_set()
            .times(1)
            .returning(|_| Err(BackendError::QuotaExceeded {
                key: "options".into(),
                bytes: 9_000,
                limit: 8_192,
            }));
        backend.expect_name().return_const("mock");

        let store = SettingsStore::new(Arc::new(backend), "options");
        assert!(matches!(
            store.read().await.unwrap_err(),
            BackendError::Unavailable(_)
        ));
        assert!(store.write(SettingsObject::new()).await.unwrap_err().is_quota());
    }

    #[test]
    fn namespace_is_fixed() {
        let store = SettingsStore::new(Arc::new(MemoryBackend::new()), "settings");
        assert_eq!(store.namespace(), "settings");
        let cloned = store.clone();
        assert_eq!(cloned.namespace(), "settings");
    }
}
