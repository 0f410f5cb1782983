//! Error types for the settings lifecycle engine
//!
//! Every failure surfaces as a rejected operation. Only an absent stored
//! value falls back to defaults; a failing backend never does.

use optsync_core::{MigrationError, SettingsError};
use optsync_store::BackendError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Backend read or write failed
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A migration aborted the run
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),

    /// Typed conversion failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Check if the backend rejected the call
    #[inline]
    #[must_use]
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// Check if a migration failed
    #[inline]
    #[must_use]
    pub fn is_migration(&self) -> bool {
        matches!(self, Self::Migration(_))
    }
}

impl From<SettingsError> for SyncError {
    fn from(err: SettingsError) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for engine operations
pub type SyncResult<T> = Result<T, SyncError>;
