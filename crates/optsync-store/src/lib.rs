//! OptionsSync Store
//!
//! The boundary between the settings engine and the durable key-value
//! area it persists into.
//!
//! # Architecture
//!
//! ```text
//! OptionsSync ──▶ SettingsStore (namespace) ──▶ dyn StorageBackend
//!                                                ├─ MemoryBackend (quotas)
//!                                                └─ JsonFileBackend (disk)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use optsync_store::{MemoryBackend, SettingsStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SettingsStore::new(Arc::new(MemoryBackend::sync_quota()), "options");
//! let stored = store.read().await?;
//! store.write(stored).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod accessor;
pub mod backend;
pub mod error;
pub mod file;
pub mod memory;

pub use accessor::SettingsStore;
pub use backend::{entry_size, StorageBackend, StorageEntry};
pub use error::{BackendError, BackendResult};
pub use file::JsonFileBackend;
pub use memory::{MemoryBackend, Quota};
