//! JSON string-leaf paths
//!
//! A `JsonPath` is the ordered list of object keys and array indices leading
//! from the document root to one value.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

// Read through `Value`: with arbitrary-precision numbers an untagged derive
// cannot see integers.
impl<'de> Deserialize<'de> for PathSegment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(key) => Ok(PathSegment::Key(key)),
            Value::Number(number) => number
                .as_u64()
                .and_then(|index| usize::try_from(index).ok())
                .map(PathSegment::Index)
                .ok_or_else(|| de::Error::custom(format!("invalid array index {number}"))),
            other => Err(de::Error::custom(format!(
                "expected a key or an array index, found {other}"
            ))),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "[{index}]"),
            PathSegment::Key(key) => write!(f, ".{key}"),
        }
    }
}

/// Full key/index path from the root to a value
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPath(pub Vec<PathSegment>);

impl JsonPath {
    pub fn root() -> Self {
        JsonPath(Vec::new())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn child_key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        JsonPath(segments)
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        JsonPath(segments)
    }
}

impl fmt::Display for JsonPath {
    /// `$.b[0]` style rendering, used in logs and strings exports
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Every string leaf of `value` with its path, in pre-order
///
/// Object members come in their stored order (insertion order with the
/// `preserve_order` feature), array items by index.
pub fn string_leaves(value: &Value) -> Vec<(JsonPath, &str)> {
    let mut leaves = Vec::new();
    collect_string_leaves(value, JsonPath::root(), &mut leaves);
    leaves
}

fn collect_string_leaves<'a>(value: &'a Value, path: JsonPath, leaves: &mut Vec<(JsonPath, &'a str)>) {
    match value {
        Value::String(s) => leaves.push((path, s.as_str())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_string_leaves(item, path.child_index(index), leaves);
            }
        }
        Value::Object(members) => {
            for (key, member) in members {
                collect_string_leaves(member, path.child_key(key), leaves);
            }
        }
        _ => {}
    }
}

/// Mutable reference to the value at `path`, if every segment resolves
pub fn pointer_mut<'a>(value: &'a mut Value, path: &JsonPath) -> Option<&'a mut Value> {
    path.segments()
        .iter()
        .try_fold(value, |current, segment| match (segment, current) {
            (PathSegment::Key(key), Value::Object(members)) => members.get_mut(key),
            (PathSegment::Index(index), Value::Array(items)) => items.get_mut(*index),
            _ => None,
        })
}

/// Overwrites the string leaf at `path`
///
/// Returns `false` when the path does not resolve or does not end at a string.
pub fn set_string_leaf(value: &mut Value, path: &JsonPath, new_value: &str) -> bool {
    match pointer_mut(value, path) {
        Some(Value::String(leaf)) => {
            *leaf = new_value.to_string();
            true
        }
        _ => false,
    }
}

/// Pretty-prints with two-space indentation and stored key order
pub fn to_pretty_string(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
