//! Error types for settings objects and migrations

/// Errors converting between settings objects and typed values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// Serde conversion failed
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Value is valid JSON but not an object
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Errors raised while migrating stored settings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// A named migration rejected the stored data
    #[error("migration '{migration}' failed: {reason}")]
    Failed {
        /// Name of the failing migration
        migration: String,
        /// Failure description
        reason: String,
    },

    /// Free-form failure from a custom migration
    #[error("migration error: {0}")]
    Custom(String),
}

impl MigrationError {
    /// Create failure attributed to a migration
    pub fn failed(migration: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            migration: migration.into(),
            reason: reason.into(),
        }
    }
}
