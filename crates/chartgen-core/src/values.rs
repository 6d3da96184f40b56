//! Chart values and the policies for combining inline values with a
//! chart's values file

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Values container with deep merge capability
///
/// Mapping keys are always strings: integer keys such as `80: http` come
/// back as `'80': http`, the same as helm's own YAML to JSON conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Parse values from a YAML (or JSON) document.
    ///
    /// An empty or comment-only document yields empty values. Anything
    /// other than a mapping at the top level is rejected.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse values from raw bytes, as returned by a loader
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Wrap an already decoded tree, which must be a mapping (or null)
    pub fn from_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Null => Ok(Self::new()),
            JsonValue::Object(_) => Ok(Self(value)),
            other => Err(CoreError::ValuesNotMapping {
                found: json_type_name(&other).to_string(),
            }),
        }
    }

    /// Serialize to a YAML document
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    /// Deep merge another Values into this one, overlay winning
    ///
    /// Rules:
    /// - Objects: recursive merge
    /// - Scalars and arrays: overlay replaces base
    /// - A null overlay value never clears a base value
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0, true);
    }

    /// Deep merge another Values into this one, base winning
    ///
    /// Only keys missing from (or null in) the base are taken from the
    /// overlay. Nested objects are walked recursively.
    pub fn merge_missing(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0, false);
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert to JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

/// How inline values are combined with the chart's values file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuesMerge {
    /// Inline values only fill keys the values file does not set
    Merge,
    /// Inline values win on conflicting keys
    #[default]
    Override,
    /// Inline values are used verbatim; the values file is ignored
    Replace,
}

impl ValuesMerge {
    /// Every accepted policy, in the order they are reported to users
    pub const LEGAL: [ValuesMerge; 3] = [
        ValuesMerge::Merge,
        ValuesMerge::Override,
        ValuesMerge::Replace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValuesMerge::Merge => "merge",
            ValuesMerge::Override => "override",
            ValuesMerge::Replace => "replace",
        }
    }

    /// Whether the chart's values file has to be read for this policy
    pub fn needs_base(&self) -> bool {
        !matches!(self, ValuesMerge::Replace)
    }

    /// Combine `inline` with `base` according to the policy
    pub fn apply(&self, mut base: Values, inline: &Values) -> Values {
        match self {
            ValuesMerge::Override => {
                base.merge(inline);
                base
            }
            ValuesMerge::Merge => {
                base.merge_missing(inline);
                base
            }
            ValuesMerge::Replace => inline.clone(),
        }
    }

    /// Render the legal set as `[merge, override, replace]`
    pub fn legal_set() -> String {
        let names: Vec<&str> = Self::LEGAL.iter().map(ValuesMerge::as_str).collect();
        format!("[{}]", names.join(", "))
    }
}

impl fmt::Display for ValuesMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a merge policy name is not recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValuesMerge(pub String);

impl fmt::Display for UnknownValuesMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "valuesMerge must be one of {}, got '{}'",
            ValuesMerge::legal_set(),
            self.0
        )
    }
}

impl std::error::Error for UnknownValuesMerge {}

impl FromStr for ValuesMerge {
    type Err = UnknownValuesMerge;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::LEGAL
            .iter()
            .copied()
            .find(|opt| opt.as_str() == s)
            .ok_or_else(|| UnknownValuesMerge(s.to_string()))
    }
}

fn deep_merge(base: &mut JsonValue, overlay: &JsonValue, overwrite: bool) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value, overwrite),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (_, JsonValue::Null) => {}
        (base, overlay) => {
            if overwrite || base.is_null() {
                *base = overlay.clone();
            }
        }
    }
}

fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return Some(value);
    }

    match value {
        JsonValue::Object(map) => map.get(path[0]).and_then(|v| get_nested(v, &path[1..])),
        _ => None,
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a sequence",
        JsonValue::Object(_) => "a mapping",
    }
}
