//! Format-neutral representation of decoded records.
//!
//! Every decoder (CSV, JSON, XML, parquet) produces [`Value`]s, so the
//! profiling engine only ever branches on four shapes: null, scalar,
//! sequence and mapping. Mappings use [`IndexMap`] to preserve key order,
//! which in turn fixes the order in which attribute paths are discovered.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered string-keyed mapping used for record objects.
pub type Mapping = IndexMap<String, Value>;

/// A leaf value together with its category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// Text.
    String(String),
    /// A number, kept in its textual form so stringification is lossless.
    Number(String),
    /// A boolean.
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Number(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Category of a value, used to derive the type tag of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    String,
    Number,
    Boolean,
    Mapping,
    Sequence,
}

/// A decoded record or any part of one.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Creates a string scalar.
    pub fn string(s: impl Into<String>) -> Self {
        Self::Scalar(Scalar::String(s.into()))
    }

    /// Creates a number scalar from its textual form.
    pub fn number(n: impl fmt::Display) -> Self {
        Self::Scalar(Scalar::Number(n.to_string()))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Scalar(Scalar::String(_)) => ValueKind::String,
            Self::Scalar(Scalar::Number(_)) => ValueKind::Number,
            Self::Scalar(Scalar::Bool(_)) => ValueKind::Boolean,
            Self::Sequence(_) => ValueKind::Sequence,
            Self::Mapping(_) => ValueKind::Mapping,
        }
    }

    /// Returns true for values that carry no information: null, the empty
    /// string and zero-length collections. `false` and `0` are not empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Scalar(Scalar::String(s)) => s.is_empty(),
            Self::Scalar(_) => false,
            Self::Sequence(items) => items.is_empty(),
            Self::Mapping(map) => map.is_empty(),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::Mapping(_))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a key when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Size descriptor used in place of a container's content, e.g. `"3 items"`.
    ///
    /// Returns `None` for scalars and null.
    pub fn size_descriptor(&self) -> Option<String> {
        match self {
            Self::Sequence(items) => Some(format!("{} items", items.len())),
            Self::Mapping(map) => Some(format!("{} items", map.len())),
            _ => None,
        }
    }

    /// Converts back to a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Scalar(Scalar::String(s)) => serde_json::Value::String(s.clone()),
            Self::Scalar(Scalar::Number(n)) => n
                .parse::<serde_json::Number>()
                .map(serde_json::Value::Number)
                .unwrap_or_else(|_| serde_json::Value::String(n.clone())),
            Self::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
            Self::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Stringification used for every frequency key: scalars print bare,
/// containers print as compact JSON and null prints as `null`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Scalar(scalar) => scalar.fmt(f),
            Self::Sequence(_) | Self::Mapping(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Self::Scalar(Scalar::Number(n.to_string())),
            serde_json::Value::String(s) => Self::Scalar(Scalar::String(s)),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::string(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::number(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::number(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Self::Mapping(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_values() {
        assert!(Value::Null.is_empty());
        assert!(Value::string("").is_empty());
        assert!(Value::Sequence(vec![]).is_empty());
        assert!(Value::Mapping(Mapping::new()).is_empty());

        assert!(!Value::from(false).is_empty());
        assert!(!Value::from(0i64).is_empty());
        assert!(!Value::string(" ").is_empty());
    }

    #[test]
    fn test_from_json_preserves_key_order() {
        let value = Value::from(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let keys: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_kinds() {
        let value = Value::from(json!({"s": "x", "n": 1.5, "b": true, "l": [1], "m": {}}));
        let kind = |k: &str| value.get(k).unwrap().kind();
        assert_eq!(kind("s"), ValueKind::String);
        assert_eq!(kind("n"), ValueKind::Number);
        assert_eq!(kind("b"), ValueKind::Boolean);
        assert_eq!(kind("l"), ValueKind::Sequence);
        assert_eq!(kind("m"), ValueKind::Mapping);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(json!(10)).to_string(), "10");
        assert_eq!(Value::from(json!(2.5)).to_string(), "2.5");
        assert_eq!(Value::from(json!(true)).to_string(), "true");
        assert_eq!(Value::from(json!("Ann")).to_string(), "Ann");
        assert_eq!(Value::from(json!([1, "a"])).to_string(), r#"[1,"a"]"#);
        assert_eq!(Value::from(json!({"k": null})).to_string(), r#"{"k":null}"#);
    }

    #[test]
    fn test_size_descriptor() {
        assert_eq!(
            Value::from(json!([1, 2, 3])).size_descriptor().as_deref(),
            Some("3 items")
        );
        assert_eq!(
            Value::from(json!({"a": 1})).size_descriptor().as_deref(),
            Some("1 items")
        );
        assert_eq!(Value::from("x").size_descriptor(), None);
    }

    #[test]
    fn test_json_round_trip_keeps_numbers() {
        let original = json!({"n": 12, "f": 0.25, "list": [{"a": "b"}]});
        assert_eq!(Value::from(original.clone()).to_json(), original);
    }
}
