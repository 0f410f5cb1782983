//! Settings Lifecycle Engine
//!
//! Every operation is a self-contained read → transform → (maybe) write
//! sequence against the backing store; the engine keeps no settings state
//! between calls and clones are cheap handles onto the same namespace.
//!
//! # Concurrency
//! Without a [`WriteGate`] there is no mutual exclusion: concurrent `set`
//! calls on one namespace are last-write-wins and can lose an update.
//! Callers needing strict consistency share a gate (or serialize calls
//! themselves).

use optsync_core::{MigrationList, SettingsObject};
use optsync_store::{SettingsStore, StorageBackend};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use crate::config::OptionsSyncConfig;
use crate::error::SyncResult;
use crate::gate::WriteGate;

/// Settings engine bound to one `(defaults, namespace)` pair
#[derive(Debug, Clone)]
pub struct OptionsSync {
    store: SettingsStore,
    defaults: Arc<SettingsObject>,
    /// Built-ins followed by configured migrations
    migrations: MigrationList,
    configured: MigrationList,
    gate: Option<WriteGate>,
}

impl OptionsSync {
    /// Create engine over `backend`
    pub fn new(backend: Arc<dyn StorageBackend>, config: OptionsSyncConfig) -> Self {
        let migrations = MigrationList::concat(&MigrationList::builtin(), &config.migrations);
        Self {
            store: SettingsStore::new(backend, config.storage_name),
            defaults: Arc::new(config.defaults),
            migrations,
            configured: config.migrations,
            gate: config.write_gate,
        }
    }

    /// Create engine with no defaults on the `options` namespace
    pub fn with_default_config(backend: Arc<dyn StorageBackend>) -> Self {
        Self::new(backend, OptionsSyncConfig::default())
    }

    /// Storage namespace
    #[inline]
    #[must_use]
    pub fn storage_name(&self) -> &str {
        self.store.namespace()
    }

    /// Configured defaults
    #[inline]
    #[must_use]
    pub fn defaults(&self) -> &SettingsObject {
        &self.defaults
    }

    /// Migrations applied by `get_all`
    #[inline]
    #[must_use]
    pub fn migrations(&self) -> &MigrationList {
        &self.migrations
    }

    /// Namespaced accessor
    #[inline]
    #[must_use]
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Configuration this engine was built from
    ///
    /// Holds the configured migrations only; built-ins are added again by
    /// [`new`](Self::new).
    #[must_use]
    pub fn config(&self) -> OptionsSyncConfig {
        OptionsSyncConfig {
            defaults: (*self.defaults).clone(),
            storage_name: self.storage_name().to_string(),
            migrations: self.configured.clone(),
            write_gate: self.gate.clone(),
        }
    }

    async fn enter(&self) -> Option<OwnedMutexGuard<()>> {
        match &self.gate {
            Some(gate) => Some(gate.acquire(self.storage_name()).await),
            None => None,
        }
    }

    /// Read the full settings
    ///
    /// # Workflow
    /// 1. Read the stored object
    /// 2. Run built-in and configured migrations over a copy
    /// 3. Persist the copy only if it differs from what was read
    /// 4. Return defaults overlaid by the (migrated) stored object
    ///
    /// # Errors
    /// - `SyncError::Backend` if the read or the post-migration write fails
    /// - `SyncError::Migration` if a migration fails; nothing is written
    pub async fn get_all(&self) -> SyncResult<SettingsObject> {
        let _lane = self.enter().await;
        let stored = self.store.read().await?;
        let migrated = self.migrate_on_change(stored).await?;
        Ok(migrated.merged_over(&self.defaults))
    }

    /// Read the full settings into a typed struct
    ///
    /// # Errors
    /// As [`get_all`](Self::get_all), plus `SyncError::Serialization` if the
    /// merged object does not match `T`
    pub async fn get_all_as<T: DeserializeOwned>(&self) -> SyncResult<T> {
        let settings = self.get_all().await?;
        Ok(settings.to_typed()?)
    }

    /// Overlay `patch` onto the stored object
    ///
    /// Merges over what is persisted, not over the defaults: stored keys not
    /// in `patch` are kept, defaults are not written back.
    ///
    /// # Errors
    /// Propagates backend failures
    pub async fn set(&self, patch: SettingsObject) -> SyncResult<()> {
        let _lane = self.enter().await;
        let mut stored = self.store.read().await?;
        tracing::debug!(namespace = %self.storage_name(), keys = patch.len(), "Applying settings patch");
        stored.merge_from(&patch);
        self.store.write(stored).await?;
        Ok(())
    }

    /// Overlay a typed value onto the stored object
    ///
    /// # Errors
    /// `SyncError::Serialization` if `value` is not an object, otherwise as
    /// [`set`](Self::set)
    pub async fn set_typed<T: Serialize>(&self, value: &T) -> SyncResult<()> {
        let patch = SettingsObject::from_typed(value)?;
        self.set(patch).await
    }

    /// Replace the stored object with `settings`
    ///
    /// Writes exactly what is given. Callers who do not want values equal
    /// to the defaults persisted filter first with
    /// [`SettingsObject::without_defaults`].
    ///
    /// # Errors
    /// Propagates backend failures
    pub async fn set_all(&self, settings: SettingsObject) -> SyncResult<()> {
        let _lane = self.enter().await;
        tracing::debug!(namespace = %self.storage_name(), keys = settings.len(), "Replacing stored settings");
        self.store.write(settings).await?;
        Ok(())
    }

    /// Apply `migrations` to the stored object and save the result
    ///
    /// Unlike the implicit run in [`get_all`](Self::get_all), this always
    /// writes, even when nothing changed.
    ///
    /// # Errors
    /// - `SyncError::Migration` if a migration fails; nothing is written
    /// - `SyncError::Backend` if the read or write fails
    pub async fn run_migrations(&self, migrations: &MigrationList) -> SyncResult<()> {
        let _lane = self.enter().await;
        let stored = self.store.read().await?;
        let migrated = migrations.apply(&stored, &self.defaults)?;
        tracing::info!(
            namespace = %self.storage_name(),
            migrations = migrations.len(),
            changed = ?stored.changed_keys(&migrated),
            "Saving migrated settings"
        );
        self.store.write(migrated).await?;
        Ok(())
    }

    async fn migrate_on_change(&self, stored: SettingsObject) -> SyncResult<SettingsObject> {
        if self.migrations.is_empty() {
            return Ok(stored);
        }

        let migrated = self.migrations.apply(&stored, &self.defaults)?;
        if migrated == stored {
            tracing::debug!(namespace = %self.storage_name(), "Migrations made no changes");
            return Ok(stored);
        }

        tracing::info!(
            namespace = %self.storage_name(),
            changed = ?stored.changed_keys(&migrated),
            "Persisting migrated settings"
        );
        self.store.write(migrated.clone()).await?;
        Ok(migrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optsync_core::{migration_fn, remove_unused, MigrationError};
    use optsync_store::MemoryBackend;
    use serde_json::json;

    fn obj(value: serde_json::Value) -> SettingsObject {
        SettingsObject::from_value(value)
    }

    fn simple_config() -> OptionsSyncConfig {
        OptionsSyncConfig::new()
            .with_defaults(obj(json!({"color": "red", "sound": true})))
            .with_storage_name("settings")
    }

    #[test]
    fn construction_keeps_namespace_and_defaults() {
        let engine = OptionsSync::new(Arc::new(MemoryBackend::new()), simple_config());
        assert_eq!(engine.storage_name(), "settings");
        assert_eq!(engine.defaults().len(), 2);
        assert!(engine.migrations().is_empty());

        let default_engine = OptionsSync::with_default_config(Arc::new(MemoryBackend::new()));
        assert_eq!(
            serde_json::to_value(default_engine.config()).unwrap(),
            json!({"defaults": {}, "storageName": "options"})
        );
    }

    #[test]
    fn config_round_trip_keeps_migration_list() {
        let config = simple_config().with_migration(remove_unused());
        let engine = OptionsSync::new(Arc::new(MemoryBackend::new()), config);

        let rebuilt = OptionsSync::new(Arc::new(MemoryBackend::new()), engine.config());
        assert_eq!(rebuilt.config().migrations.names(), vec!["removeUnused"]);
        assert_eq!(rebuilt.migrations().len(), engine.migrations().len());
        assert_eq!(
            rebuilt.migrations().len(),
            MigrationList::builtin().len() + 1
        );
    }

    #[tokio::test]
    async fn get_all_empty_storage_is_defaults() {
        let engine = OptionsSync::new(Arc::new(MemoryBackend::new()), simple_config());
        assert_eq!(
            engine.get_all().await.unwrap().into_value(),
            json!({"color": "red", "sound": true})
        );
    }

    #[tokio::test]
    async fn set_then_get_all() {
        let backend = Arc::new(MemoryBackend::new());
        let engine = OptionsSync::new(backend.clone(), simple_config());

        engine.set(obj(json!({"sound": false}))).await.unwrap();
        assert_eq!(backend.raw("settings"), Some(json!({"sound": false})));
        assert_eq!(
            engine.get_all().await.unwrap().into_value(),
            json!({"color": "red", "sound": false})
        );
    }

    #[tokio::test]
    async fn failed_migration_writes_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_raw("options", json!({"size": 30}));

        let config = OptionsSyncConfig::new()
            .with_migration(migration_fn("rename", |s, _| {
                if let Some(size) = s.remove("size") {
                    s.insert("minSize", size);
                }
                Ok(())
            }))
            .with_migration(migration_fn("reject", |_, _| {
                Err(MigrationError::Custom("unsupported".into()))
            }));
        let engine = OptionsSync::new(backend.clone(), config);

        assert!(engine.get_all().await.unwrap_err().is_migration());
        assert_eq!(backend.raw("options"), Some(json!({"size": 30})));
    }

    #[tokio::test]
    async fn run_migrations_writes_pruned_object() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_raw("settings", json!({"size": 30, "sound": false}));
        let engine = OptionsSync::new(backend.clone(), simple_config());

        engine
            .run_migrations(&MigrationList::new().with(remove_unused()))
            .await
            .unwrap();
        assert_eq!(backend.raw("settings"), Some(json!({"sound": false})));
    }

    #[tokio::test]
    async fn typed_access() {
        #[derive(Debug, PartialEq, serde::Deserialize, Serialize)]
        struct Prefs {
            color: String,
            sound: bool,
        }

        let engine = OptionsSync::new(Arc::new(MemoryBackend::new()), simple_config());
        engine
            .set_typed(&Prefs {
                color: "blue".into(),
                sound: true,
            })
            .await
            .unwrap();

        let prefs: Prefs = engine.get_all_as().await.unwrap();
        assert_eq!(prefs.color, "blue");
        assert!(engine.set_typed(&"text").await.is_err());
    }
}
