//! Construction-time configuration
//!
//! `defaults` and `storageName` are plain data and can be loaded from
//! JSON or YAML. Migrations and the write gate are code and are attached
//! through the builder.

use optsync_core::{Migration, MigrationList, SettingsObject};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::gate::WriteGate;

/// Namespace used when none is configured
pub const DEFAULT_STORAGE_NAME: &str = "options";

fn default_storage_name() -> String {
    DEFAULT_STORAGE_NAME.to_string()
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptionsSyncConfig {
    /// Values used for keys that are not stored
    #[serde(default)]
    pub defaults: SettingsObject,
    /// Backend slot owned by the engine
    #[serde(default = "default_storage_name")]
    pub storage_name: String,
    /// Migrations run after the built-ins on every `get_all`
    #[serde(skip)]
    pub migrations: MigrationList,
    /// Optional serialization of operations per namespace
    #[serde(skip)]
    pub write_gate: Option<WriteGate>,
}

impl OptionsSyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load data part from JSON
    ///
    /// # Errors
    /// Returns `SyncError::Config` if the document is invalid
    pub fn from_json(json: &str) -> SyncResult<Self> {
        serde_json::from_str(json).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Load data part from YAML
    ///
    /// # Errors
    /// Returns `SyncError::Config` if the document is invalid
    pub fn from_yaml(yaml: &str) -> SyncResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// With defaults
    #[inline]
    #[must_use]
    pub fn with_defaults(mut self, defaults: SettingsObject) -> Self {
        self.defaults = defaults;
        self
    }

    /// With storage namespace
    #[inline]
    #[must_use]
    pub fn with_storage_name(mut self, name: impl Into<String>) -> Self {
        self.storage_name = name.into();
        self
    }

    /// Append one migration
    #[must_use]
    pub fn with_migration(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(migration);
        self
    }

    /// Append a list of migrations
    #[must_use]
    pub fn with_migrations(mut self, migrations: &MigrationList) -> Self {
        self.migrations.extend(migrations);
        self
    }

    /// With shared write gate
    #[inline]
    #[must_use]
    pub fn with_write_gate(mut self, gate: WriteGate) -> Self {
        self.write_gate = Some(gate);
        self
    }
}

impl Default for OptionsSyncConfig {
    fn default() -> Self {
        Self {
            defaults: SettingsObject::new(),
            storage_name: default_storage_name(),
            migrations: MigrationList::new(),
            write_gate: None,
        }
    }
}
