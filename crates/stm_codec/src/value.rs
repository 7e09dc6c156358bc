//! Dynamic CBOR value type.

use crate::encoder::{canonical_entries, to_canonical_cbor};
use std::fmt;

/// A dynamic CBOR value.
///
/// Every value stored through the engine passes through this type. Floats
/// are deliberately absent: they have no single canonical encoding, and
/// dirty checks compare encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Text string.
    Text(String),
    /// Array of values.
    Array(Vec<Value>),
    /// Map entries, in canonical key order when built with [`Value::map`].
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Builds a map with entries in canonical key order.
    ///
    /// When two entries share a key the later one wins.
    #[must_use]
    pub fn map(pairs: Vec<(Value, Value)>) -> Self {
        let keyed: Vec<(Vec<u8>, (Value, Value))> = pairs
            .into_iter()
            .map(|(key, value)| (to_canonical_cbor(&key), (key, value)))
            .collect();
        Value::Map(
            canonical_entries(keyed)
                .into_iter()
                .map(|(_, pair)| pair)
                .collect(),
        )
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text, if this is a text string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes, if this is a byte string.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries, if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Looks up a text key in a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Bytes(bytes) => {
                f.write_str("h'")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(pairs) => {
                f.write_str("{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_orders_keys_shortest_first() {
        let value = Value::map(vec![
            ("bb".into(), 1.into()),
            ("a".into(), 2.into()),
            ("c".into(), 3.into()),
        ]);
        let keys: Vec<_> = value
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_text().unwrap())
            .collect();
        assert_eq!(keys, vec!["a", "c", "bb"]);
    }

    #[test]
    fn map_later_duplicate_wins() {
        let value = Value::map(vec![("k".into(), 1.into()), ("k".into(), 2.into())]);
        assert_eq!(value.as_map().unwrap().len(), 1);
        assert_eq!(value.get("k"), Some(&Value::Integer(2)));
    }

    #[test]
    fn accessors_match_variants() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(-3i64).as_integer(), Some(-3));
        assert_eq!(Value::from("x").as_text(), Some("x"));
        assert_eq!(Value::from(vec![1u8]).as_bytes(), Some(&[1u8][..]));
        assert_eq!(Value::from("x").as_integer(), None);
        assert_eq!(Value::Integer(1).get("k"), None);
    }

    #[test]
    fn display_uses_diagnostic_notation() {
        let value = Value::map(vec![
            ("test".into(), Value::Array(vec![1.into(), Value::Null])),
            ("b".into(), Value::Bytes(vec![0xca, 0xfe])),
        ]);
        assert_eq!(value.to_string(), r#"{"b": h'cafe', "test": [1, null]}"#);
    }
}
