//! Value types for MirrorKV
//!
//! This module defines:
//! - Value: Unified enum for everything a mirrored store entry can hold
//!
//! ## Value Model
//!
//! The Value enum has exactly 7 variants, one per JSON-representable type:
//! - Null, Bool, Int, Float, String, Array, Object
//!
//! Snapshots are plain JSON, so the enum is `#[serde(untagged)]`: a store
//! entry round-trips to the obvious JSON text, not to a tagged envelope.
//!
//! ### Type Rules
//!
//! - No implicit type coercions
//! - `Int(1) != Float(1.0)` - different types are NEVER equal
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//! - Non-finite floats (`NaN`, `±inf`) are representable in memory but are
//!   rejected by the snapshot codec, since JSON has no spelling for them.
//!   That rejection is the system's recoverable serialization failure.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical MirrorKV value type for store entries
///
/// ## Type Equality
///
/// Different types are NEVER equal, even if they contain the same "value":
/// - `Int(1) != Float(1.0)`
///
/// Float equality follows IEEE-754 semantics:
/// - `NaN != NaN`
/// - `-0.0 == 0.0`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer (tried before Float on deserialization)
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object with string keys, ordered for deterministic snapshots
    Object(BTreeMap<String, Value>),
}

// Custom PartialEq implementation for IEEE-754 float semantics
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            // Different types are NEVER equal
            _ => false,
        }
    }
}

impl Value {
    /// Human-readable type name for logging/debugging
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Check if this value is Null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the bool if this is a Bool variant
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the integer if this is an Int variant
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the float if this is a Float variant
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the string slice if this is a String variant
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the array slice if this is an Array variant
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get the object map if this is an Object variant
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Check that every float reachable from this value is finite
    ///
    /// JSON cannot represent NaN or infinities, so the snapshot codec
    /// refuses values that fail this check.
    pub fn is_json_representable(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            Value::Array(items) => items.iter().all(Value::is_json_representable),
            Value::Object(map) => map.values().all(Value::is_json_representable),
            _ => true,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Bool(true).type_name(), "bool");
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::Float(1.0).type_name(), "float");
        assert_eq!(Value::String("s".into()).type_name(), "string");
        assert_eq!(Value::Array(vec![]).type_name(), "array");
        assert_eq!(Value::Object(BTreeMap::new()).type_name(), "object");
    }

    #[test]
    fn test_different_types_never_equal() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Null, Value::Bool(false));
        assert_ne!(Value::Int(0), Value::Bool(false));
    }

    #[test]
    fn test_float_ieee754_equality() {
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));
    }

    #[test]
    fn test_untagged_json_shape() {
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Value::Int(42)).unwrap(), "42");
        assert_eq!(
            serde_json::to_string(&Value::String("hi".into())).unwrap(),
            "\"hi\""
        );
        let arr = Value::Array(vec![Value::Bool(true), Value::Int(2)]);
        assert_eq!(serde_json::to_string(&arr).unwrap(), "[true,2]");
    }

    #[test]
    fn test_untagged_roundtrip() {
        let mut obj = BTreeMap::new();
        obj.insert("a".to_string(), Value::Int(1));
        obj.insert("b".to_string(), Value::Float(2.5));
        obj.insert("c".to_string(), Value::Array(vec![Value::Null]));
        let original = Value::Object(obj);

        let text = serde_json::to_string(&original).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_integer_not_parsed_as_float() {
        let parsed: Value = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, Value::Int(7));

        let parsed: Value = serde_json::from_str("7.25").unwrap();
        assert_eq!(parsed, Value::Float(7.25));
    }

    #[test]
    fn test_json_representable() {
        assert!(Value::Float(1.5).is_json_representable());
        assert!(!Value::Float(f64::NAN).is_json_representable());
        assert!(!Value::Float(f64::INFINITY).is_json_representable());

        let nested = Value::Array(vec![Value::Object(
            [("x".to_string(), Value::Float(f64::NEG_INFINITY))]
                .into_iter()
                .collect(),
        )]);
        assert!(!nested.is_json_representable());
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(3i64), Value::Int(3));
        assert_eq!(Value::from(3i32), Value::Int(3));
        assert_eq!(Value::from(1.5), Value::Float(1.5));
        assert_eq!(Value::from("x"), Value::String("x".into()));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(9).as_int(), Some(9));
        assert_eq!(Value::Float(0.5).as_float(), Some(0.5));
        assert_eq!(Value::String("s".into()).as_str(), Some("s"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Null.as_int(), None);
    }
}
