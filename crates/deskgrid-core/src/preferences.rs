//! Typed workspace preferences.
//!
//! Preferences are a key → value map. Keys come from a small fixed set:
//!
//! | key      | value  | satisfied when                          |
//! |----------|--------|-----------------------------------------|
//! | `floor`  | number | workspace is on that floor              |
//! | `zone`   | text   | workspace is in that zone               |
//! | *other*  | flag   | facility present (`true`) / absent (`false`) |
//! | *other*  | text   | the text names a facility that is present |
//! | *other*  | number | facility named by the key is present    |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Preference map as carried by employees and requests.
pub type Preferences = BTreeMap<String, PreferenceValue>;

/// Value side of a preference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

/// Key side of a preference entry, parsed from its string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    Floor,
    Zone,
    Facility(String),
}

impl PreferenceKey {
    pub fn parse(key: &str) -> Self {
        match key {
            "floor" => PreferenceKey::Floor,
            "zone" => PreferenceKey::Zone,
            other => PreferenceKey::Facility(other.to_string()),
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceKey::Floor => f.write_str("floor"),
            PreferenceKey::Zone => f.write_str("zone"),
            PreferenceKey::Facility(tag) => f.write_str(tag),
        }
    }
}

impl From<bool> for PreferenceValue {
    fn from(v: bool) -> Self {
        PreferenceValue::Flag(v)
    }
}

impl From<i64> for PreferenceValue {
    fn from(v: i64) -> Self {
        PreferenceValue::Number(v)
    }
}

impl From<&str> for PreferenceValue {
    fn from(v: &str) -> Self {
        PreferenceValue::Text(v.to_string())
    }
}

impl PreferenceValue {
    /// Parse a CLI-style `value` string: `true`/`false`, an integer, or text.
    pub fn parse_loose(raw: &str) -> Self {
        match raw {
            "true" => PreferenceValue::Flag(true),
            "false" => PreferenceValue::Flag(false),
            _ => raw
                .parse::<i64>()
                .map(PreferenceValue::Number)
                .unwrap_or_else(|_| PreferenceValue::Text(raw.to_string())),
        }
    }
}

/// Overlay `overrides` on top of `base`; keys in `overrides` win.
pub fn merge(base: &Preferences, overrides: &Preferences) -> Preferences {
    let mut merged = base.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
