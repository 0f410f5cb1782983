//! OptionsSync Core
//!
//! Data model of the settings lifecycle:
//! - [`SettingsObject`]: flat key-value settings with shallow merge semantics
//! - [`Migration`] / [`MigrationList`]: ordered in-place upgrades of stored data
//! - [`RemoveUnused`]: built-in pruning of keys the defaults no longer declare
//!
//! # Example
//!
//! ```
//! use optsync_core::{remove_unused, MigrationList, SettingsObject};
//! use serde_json::json;
//!
//! let defaults = SettingsObject::from_value(json!({"color": "red", "sound": true}));
//! let stored = SettingsObject::from_value(json!({"size": 30, "sound": false}));
//!
//! let migrated = MigrationList::new()
//!     .with(remove_unused())
//!     .apply(&stored, &defaults)
//!     .unwrap();
//!
//! assert_eq!(
//!     migrated.merged_over(&defaults).into_value(),
//!     json!({"color": "red", "sound": false}),
//! );
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod migration;
pub mod settings;

pub use error::{MigrationError, SettingsError};
pub use migration::{migration_fn, remove_unused, FnMigration, Migration, MigrationList, RemoveUnused};
pub use settings::{json_kind, SettingsObject};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
