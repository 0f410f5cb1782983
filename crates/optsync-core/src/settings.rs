//! Settings Object
//!
//! A flat mapping from setting name to arbitrary JSON value. Merging is
//! shallow by contract: only top-level keys are overlaid, nested objects
//! and arrays are replaced wholesale.

use std::collections::BTreeSet;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::SettingsError;

/// Persisted key-value mapping representing user configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsObject(Map<String, JsonValue>);

impl SettingsObject {
    /// Create empty settings object
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap an existing JSON map
    #[inline]
    #[must_use]
    pub fn from_map(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }

    /// Convert a JSON value, returning `None` unless it is an object
    #[inline]
    #[must_use]
    pub fn try_from_value(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Convert a JSON value; anything that is not an object becomes `{}`
    ///
    /// # Examples
    /// ```
    /// # use optsync_core::SettingsObject;
    /// # use serde_json::json;
    /// let settings = SettingsObject::from_value(json!({"color": "red"}));
    /// assert_eq!(settings.get("color"), Some(&json!("red")));
    /// assert!(SettingsObject::from_value(json!(42)).is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn from_value(value: JsonValue) -> Self {
        Self::try_from_value(value).unwrap_or_default()
    }

    /// Deserialize into a typed struct
    ///
    /// # Errors
    /// Returns `SettingsError::Serialization` if the object does not match `T`
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, SettingsError> {
        serde_json::from_value(JsonValue::Object(self.0.clone()))
            .map_err(|e| SettingsError::Serialization(e.to_string()))
    }

    /// Serialize a typed struct into a settings object
    ///
    /// # Errors
    /// - `SettingsError::Serialization` if `T` fails to serialize
    /// - `SettingsError::NotAnObject` if `T` serializes to a non-object
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, SettingsError> {
        let json =
            serde_json::to_value(value).map_err(|e| SettingsError::Serialization(e.to_string()))?;
        match json {
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(SettingsError::NotAnObject(json_kind(&other))),
        }
    }

    /// Get value by key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Get mutable value by key
    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut JsonValue> {
        self.0.get_mut(key)
    }

    /// Insert a value, returning the previous one
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.0.insert(key.into(), value)
    }

    /// Remove a key, returning its value
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.0.remove(key)
    }

    /// Check if key is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of top-level keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over keys
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Iterate over entries
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    /// Borrow the underlying map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    /// Consume into the underlying map
    #[inline]
    #[must_use]
    pub fn into_map(self) -> Map<String, JsonValue> {
        self.0
    }

    /// Consume into a JSON object value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.0)
    }

    /// Overlay `patch` onto `self` in place; patch keys win
    pub fn merge_from(&mut self, patch: &Self) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Return `base` overlaid by `self`; keys of `self` win
    ///
    /// # Examples
    /// ```
    /// # use optsync_core::SettingsObject;
    /// # use serde_json::json;
    /// let defaults = SettingsObject::from_value(json!({"color": "red", "sound": true}));
    /// let stored = SettingsObject::from_value(json!({"color": "fucsia", "people": 3}));
    /// assert_eq!(
    ///     stored.merged_over(&defaults).into_value(),
    ///     json!({"color": "fucsia", "sound": true, "people": 3}),
    /// );
    /// ```
    #[must_use]
    pub fn merged_over(&self, base: &Self) -> Self {
        let mut merged = base.clone();
        merged.merge_from(self);
        merged
    }

    /// Copy without the keys whose value equals the same-named default
    #[must_use]
    pub fn without_defaults(&self, defaults: &Self) -> Self {
        self.0
            .iter()
            .filter(|(key, value)| defaults.get(key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Drop every key not present in `other`, returning the removed keys
    pub fn retain_keys_of(&mut self, other: &Self) -> Vec<String> {
        let removed: Vec<String> = self
            .0
            .keys()
            .filter(|key| !other.contains_key(key))
            .cloned()
            .collect();
        for key in &removed {
            self.0.remove(key);
        }
        removed
    }

    /// Keys added, removed or changed between `self` and `other` (sorted)
    #[must_use]
    pub fn changed_keys(&self, other: &Self) -> Vec<String> {
        let all: BTreeSet<&String> = self.0.keys().chain(other.0.keys()).collect();
        all.into_iter()
            .filter(|key| self.0.get(*key) != other.0.get(*key))
            .cloned()
            .collect()
    }
}

impl From<Map<String, JsonValue>> for SettingsObject {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

impl From<SettingsObject> for JsonValue {
    fn from(settings: SettingsObject) -> Self {
        settings.into_value()
    }
}

impl FromIterator<(String, JsonValue)> for SettingsObject {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for SettingsObject {
    type Item = (String, JsonValue);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Short name of a JSON value's kind, for diagnostics
#[must_use]
pub fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: JsonValue) -> SettingsObject {
        SettingsObject::from_value(value)
    }

    #[test]
    fn stored_values_win_over_defaults() {
        let defaults = obj(json!({"color": "red", "sound": true}));
        let stored = obj(json!({"color": "fucsia", "people": 3}));

        let merged = stored.merged_over(&defaults);
        assert_eq!(
            merged.into_value(),
            json!({"color": "fucsia", "sound": true, "people": 3})
        );
    }

    #[test]
    fn merge_is_shallow() {
        let defaults = obj(json!({"theme": {"dark": true, "accent": "blue"}}));
        let stored = obj(json!({"theme": {"dark": false}}));

        let merged = stored.merged_over(&defaults);
        assert_eq!(merged.get("theme"), Some(&json!({"dark": false})));
    }

    #[test]
    fn merge_from_keeps_untouched_keys() {
        let mut stored = obj(json!({"size": 30}));
        stored.merge_from(&obj(json!({"sound": false})));
        assert_eq!(stored.into_value(), json!({"size": 30, "sound": false}));
    }

    #[test]
    fn without_defaults_drops_equal_values_only() {
        let defaults = obj(json!({"color": "red", "sound": true}));
        let settings = obj(json!({"name": "Rico", "people": 3, "sound": true, "color": "blue"}));

        let filtered = settings.without_defaults(&defaults);
        assert_eq!(
            filtered.into_value(),
            json!({"name": "Rico", "people": 3, "color": "blue"})
        );
    }

    #[test]
    fn retain_keys_of_reports_removed() {
        let defaults = obj(json!({"color": "red", "sound": true}));
        let mut stored = obj(json!({"size": 30, "sound": false}));

        let removed = stored.retain_keys_of(&defaults);
        assert_eq!(removed, vec!["size".to_string()]);
        assert_eq!(stored.into_value(), json!({"sound": false}));
    }

    #[test]
    fn changed_keys_covers_add_remove_update() {
        let before = obj(json!({"size": 30, "keep": 1, "flip": true}));
        let after = obj(json!({"minSize": 30, "keep": 1, "flip": false}));

        assert_eq!(before.changed_keys(&after), vec!["flip", "minSize", "size"]);
        assert!(before.changed_keys(&before.clone()).is_empty());
    }

    #[test]
    fn non_object_values_become_empty() {
        assert!(SettingsObject::try_from_value(json!("text")).is_none());
        assert!(SettingsObject::from_value(json!([1, 2])).is_empty());
        assert!(SettingsObject::from_value(JsonValue::Null).is_empty());
    }

    #[test]
    fn typed_roundtrip_and_errors() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Prefs {
            color: String,
            sound: bool,
        }

        let prefs = Prefs {
            color: "red".into(),
            sound: true,
        };
        let settings = SettingsObject::from_typed(&prefs).unwrap();
        assert_eq!(settings.get("sound"), Some(&json!(true)));
        assert_eq!(settings.to_typed::<Prefs>().unwrap(), prefs);

        let err = SettingsObject::from_typed(&7_u32).unwrap_err();
        assert!(matches!(err, SettingsError::NotAnObject("number")));

        let err = obj(json!({"color": 1})).to_typed::<Prefs>().unwrap_err();
        assert!(matches!(err, SettingsError::Serialization(_)));
    }

    #[test]
    fn serializes_transparently() {
        let settings = obj(json!({"a": 1}));
        assert_eq!(serde_json::to_string(&settings).unwrap(), r#"{"a":1}"#);
        let back: SettingsObject = serde_json::from_str(r#"{"b":false}"#).unwrap();
        assert_eq!(back.get("b"), Some(&json!(false)));
    }
}
