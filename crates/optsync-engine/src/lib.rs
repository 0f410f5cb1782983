//! OptionsSync Engine
//!
//! Owns the settings lifecycle of one storage namespace:
//! - Merge-on-read: defaults overlaid by whatever is stored
//! - Patch writes: partial updates merged over the persisted object
//! - Migrations: ordered in-place upgrades of stored data, persisted only
//!   when they change something
//!
//! # Example
//!
//! ```rust,ignore
//! use optsync_engine::{OptionsSync, OptionsSyncConfig};
//! use optsync_core::{remove_unused, SettingsObject};
//! use optsync_store::MemoryBackend;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OptionsSyncConfig::new()
//!     .with_defaults(SettingsObject::from_value(json!({"color": "red", "sound": true})))
//!     .with_storage_name("settings")
//!     .with_migration(remove_unused());
//! let sync = OptionsSync::new(Arc::new(MemoryBackend::sync_quota()), config);
//!
//! sync.set(SettingsObject::from_value(json!({"sound": false}))).await?;
//! let settings = sync.get_all().await?;
//! assert_eq!(settings.get("color"), Some(&json!("red")));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;

pub use config::{OptionsSyncConfig, DEFAULT_STORAGE_NAME};
pub use engine::OptionsSync;
pub use error::{SyncError, SyncResult};
pub use gate::WriteGate;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the engine
    pub use crate::{OptionsSync, OptionsSyncConfig, SyncError, SyncResult, WriteGate};
    pub use optsync_core::{
        migration_fn, remove_unused, Migration, MigrationError, MigrationList, SettingsObject,
    };
    pub use optsync_store::{BackendError, JsonFileBackend, MemoryBackend, StorageBackend};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
