//! Index keys
//!
//! Every index, primary and secondary, is a key-sorted sequence of entries.
//! Keys are derived from JSON scalars and have a total, deterministic order:
//! Bool < Int < Float < String.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Index key representing a serialized field value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexKey {
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value (stored as order-preserving bits)
    Float(u64),
    /// String value
    String(String),
}

/// Record identifiers are index keys over the `idAttr` value.
pub type RecordId = IndexKey;

impl IndexKey {
    /// Create a key from a boolean
    pub fn from_bool(v: bool) -> Self {
        IndexKey::Bool(v)
    }

    /// Create a key from an integer
    pub fn from_int(v: i64) -> Self {
        IndexKey::Int(v)
    }

    /// Create a key from a float
    ///
    /// Uses bit representation for total ordering.
    pub fn from_float(v: f64) -> Self {
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        IndexKey::Float(ordered)
    }

    /// Create a key from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Create a key from a JSON scalar.
    ///
    /// Null, arrays and objects have no key.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(IndexKey::from_bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(IndexKey::from_int(i))
                } else {
                    n.as_f64().map(IndexKey::from_float)
                }
            }
            Value::String(s) => Some(IndexKey::from_string(s)),
            _ => None,
        }
    }

    /// Keys for a field value: one per scalar, one per scalar array element.
    pub fn all_from_json(value: &Value) -> Vec<Self> {
        match value {
            Value::Array(items) => items.iter().filter_map(IndexKey::from_json).collect(),
            other => IndexKey::from_json(other).into_iter().collect(),
        }
    }

    /// Decode a float key back to its value
    fn float_value(ordered: u64) -> f64 {
        let bits = if (ordered >> 63) == 1 {
            ordered ^ (1 << 63)
        } else {
            !ordered
        };
        f64::from_bits(bits)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Bool(b) => write!(f, "{}", b),
            IndexKey::Int(i) => write!(f, "{}", i),
            IndexKey::Float(bits) => write!(f, "{}", IndexKey::float_value(*bits)),
            IndexKey::String(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_ordering() {
        let keys = vec![
            IndexKey::from_bool(false),
            IndexKey::from_bool(true),
            IndexKey::from_int(-100),
            IndexKey::from_int(0),
            IndexKey::from_int(100),
            IndexKey::from_float(-2.5),
            IndexKey::from_float(0.5),
            IndexKey::from_float(10.25),
            IndexKey::from_string("aaa"),
            IndexKey::from_string("zzz"),
        ];

        for i in 1..keys.len() {
            assert!(keys[i - 1] < keys[i], "Keys should be ordered");
        }
    }

    #[test]
    fn test_from_json() {
        assert_eq!(IndexKey::from_json(&json!(true)), Some(IndexKey::Bool(true)));
        assert_eq!(IndexKey::from_json(&json!(42)), Some(IndexKey::Int(42)));
        assert_eq!(
            IndexKey::from_json(&json!("hello")),
            Some(IndexKey::String("hello".to_string()))
        );
        assert_eq!(IndexKey::from_json(&json!(null)), None);
        assert_eq!(IndexKey::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_all_from_json_flattens_arrays() {
        let keys = IndexKey::all_from_json(&json!(["rust", 7, null, ["nested"]]));
        assert_eq!(keys, vec![IndexKey::from_string("rust"), IndexKey::from_int(7)]);
    }

    #[test]
    fn test_display_float() {
        assert_eq!(IndexKey::from_float(-2.5).to_string(), "-2.5");
        assert_eq!(IndexKey::from_float(3.75).to_string(), "3.75");
        assert_eq!(IndexKey::from_int(3).to_string(), "3");
    }
}
