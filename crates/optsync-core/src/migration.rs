//! Stored-data migrations
//!
//! A [`Migration`] rewrites a working copy of the stored settings in place.
//! Migrations are composed into an ordered [`MigrationList`] and always run
//! against the cumulative result of the previous step.

use std::fmt;
use std::sync::Arc;

use crate::error::MigrationError;
use crate::settings::SettingsObject;

/// In-place transform that upgrades stored settings to a newer shape
///
/// # Contract
/// - Only `working` may be mutated
/// - Running a migration on already-migrated data should be a no-op, so
///   the engine can skip redundant writes
pub trait Migration: Send + Sync + fmt::Debug {
    /// Migration name (for diagnostics)
    fn name(&self) -> &str;

    /// Whether the migration reads the configured defaults
    ///
    /// Migrations that return `false` are handed an empty defaults object.
    fn uses_defaults(&self) -> bool {
        false
    }

    /// Mutate `working` in place
    ///
    /// # Errors
    /// Any error aborts the remaining migrations of the run
    fn migrate(
        &self,
        working: &mut SettingsObject,
        defaults: &SettingsObject,
    ) -> Result<(), MigrationError>;
}

type MigrateFn =
    dyn Fn(&mut SettingsObject, &SettingsObject) -> Result<(), MigrationError> + Send + Sync;

/// Named closure migration
pub struct FnMigration {
    name: String,
    uses_defaults: bool,
    f: Box<MigrateFn>,
}

impl FnMigration {
    /// Create closure migration
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut SettingsObject, &SettingsObject) -> Result<(), MigrationError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            uses_defaults: false,
            f: Box::new(f),
        }
    }

    /// Mark the closure as reading the defaults
    #[inline]
    #[must_use]
    pub fn reading_defaults(mut self) -> Self {
        self.uses_defaults = true;
        self
    }
}

impl fmt::Debug for FnMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMigration")
            .field("name", &self.name)
            .field("uses_defaults", &self.uses_defaults)
            .finish_non_exhaustive()
    }
}

impl Migration for FnMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn uses_defaults(&self) -> bool {
        self.uses_defaults
    }

    fn migrate(
        &self,
        working: &mut SettingsObject,
        defaults: &SettingsObject,
    ) -> Result<(), MigrationError> {
        (self.f)(working, defaults)
    }
}

/// Shorthand for [`FnMigration::new`]
pub fn migration_fn<F>(name: impl Into<String>, f: F) -> FnMigration
where
    F: Fn(&mut SettingsObject, &SettingsObject) -> Result<(), MigrationError>
        + Send
        + Sync
        + 'static,
{
    FnMigration::new(name, f)
}

/// Deletes every stored key that the defaults no longer declare
///
/// User-set values for keys still present in the defaults are kept,
/// whether or not they equal the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveUnused;

impl RemoveUnused {
    /// Migration name
    pub const NAME: &'static str = "removeUnused";
}

impl Migration for RemoveUnused {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn uses_defaults(&self) -> bool {
        true
    }

    fn migrate(
        &self,
        working: &mut SettingsObject,
        defaults: &SettingsObject,
    ) -> Result<(), MigrationError> {
        let removed = working.retain_keys_of(defaults);
        if !removed.is_empty() {
            tracing::debug!(removed = ?removed, "Pruned keys absent from defaults");
        }
        Ok(())
    }
}

/// Built-in `removeUnused` migration
#[inline]
#[must_use]
pub fn remove_unused() -> RemoveUnused {
    RemoveUnused
}

/// Ordered sequence of migrations
#[derive(Debug, Clone, Default)]
pub struct MigrationList {
    steps: Vec<Arc<dyn Migration>>,
}

impl MigrationList {
    /// Create empty list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upgrades shipped with the engine, run ahead of configured ones
    ///
    /// Empty for now: `removeUnused` stays opt-in because running it on every
    /// read would discard keys the caller never declared as defaults.
    #[inline]
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
    }

    /// Append a migration (builder style)
    #[must_use]
    pub fn with(mut self, migration: impl Migration + 'static) -> Self {
        self.push(migration);
        self
    }

    /// Append a migration
    pub fn push(&mut self, migration: impl Migration + 'static) {
        self.steps.push(Arc::new(migration));
    }

    /// Append every migration of `other`, keeping order
    pub fn extend(&mut self, other: &Self) {
        self.steps.extend(other.steps.iter().cloned());
    }

    /// `first` followed by `second`
    #[must_use]
    pub fn concat(first: &Self, second: &Self) -> Self {
        let mut list = first.clone();
        list.extend(second);
        list
    }

    /// Number of migrations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Migration names in application order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|m| m.name()).collect()
    }

    /// Iterate in application order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Migration>> {
        self.steps.iter()
    }

    /// Run every migration over a copy of `stored`
    ///
    /// # Returns
    /// The migrated copy; `stored` itself is never touched
    ///
    /// Only migrations declaring [`Migration::uses_defaults`] see `defaults`.
    ///
    /// # Errors
    /// Returns the first failure. Untargeted `MigrationError::Custom`
    /// errors are attributed to the failing migration.
    pub fn apply(
        &self,
        stored: &SettingsObject,
        defaults: &SettingsObject,
    ) -> Result<SettingsObject, MigrationError> {
        let no_defaults = SettingsObject::new();
        let mut working = stored.clone();
        for (index, migration) in self.steps.iter().enumerate() {
            let visible = if migration.uses_defaults() {
                defaults
            } else {
                &no_defaults
            };
            tracing::debug!(
                migration = migration.name(),
                step = index,
                "Applying migration"
            );
            migration
                .migrate(&mut working, visible)
                .map_err(|e| match e {
                    MigrationError::Custom(reason) => {
                        MigrationError::failed(migration.name(), reason)
                    }
                    other => other,
                })?;
        }
        Ok(working)
    }
}
