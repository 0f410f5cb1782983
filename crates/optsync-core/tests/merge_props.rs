//! Property tests for merge and migration semantics

use optsync_core::{remove_unused, MigrationList, SettingsObject};
use proptest::prelude::*;
use serde_json::Value;

fn settings_strategy() -> impl Strategy<Value = SettingsObject> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::String),
    ];
    proptest::collection::btree_map("[a-e]", leaf, 0..6)
        .prop_map(|map| map.into_iter().collect::<SettingsObject>())
}

proptest! {
    #[test]
    fn prop_merged_keeps_every_default_key(
        defaults in settings_strategy(),
        stored in settings_strategy(),
    ) {
        let merged = stored.merged_over(&defaults);
        for key in defaults.keys() {
            prop_assert!(merged.contains_key(key));
        }
    }

    #[test]
    fn prop_stored_values_take_precedence(
        defaults in settings_strategy(),
        stored in settings_strategy(),
    ) {
        let merged = stored.merged_over(&defaults);
        for (key, value) in stored.iter() {
            prop_assert_eq!(merged.get(key), Some(value));
        }
        for (key, value) in defaults.iter() {
            if !stored.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
        prop_assert!(merged.len() <= defaults.len() + stored.len());
    }

    #[test]
    fn prop_patch_never_drops_stored_keys(
        stored in settings_strategy(),
        patch in settings_strategy(),
    ) {
        let mut written = stored.clone();
        written.merge_from(&patch);
        for key in stored.keys() {
            prop_assert!(written.contains_key(key));
        }
        for (key, value) in patch.iter() {
            prop_assert_eq!(written.get(key), Some(value));
        }
    }

    #[test]
    fn prop_remove_unused_is_idempotent(
        defaults in settings_strategy(),
        stored in settings_strategy(),
    ) {
        let list = MigrationList::new().with(remove_unused());
        let once = list.apply(&stored, &defaults).unwrap();
        let twice = list.apply(&once, &defaults).unwrap();
        prop_assert_eq!(&once, &twice);
        for (key, value) in once.iter() {
            prop_assert!(defaults.contains_key(key));
            prop_assert_eq!(stored.get(key), Some(value));
        }
    }

    #[test]
    fn prop_without_defaults_then_merge_restores_settings(
        defaults in settings_strategy(),
        settings in settings_strategy(),
    ) {
        let trimmed = settings.without_defaults(&defaults);
        let restored = trimmed.merged_over(&defaults);
        for (key, value) in settings.iter() {
            prop_assert_eq!(restored.get(key), Some(value));
        }
    }
}
