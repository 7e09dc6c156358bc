//! Canonical CBOR encoder.

use crate::value::Value;
use std::cmp::Ordering;

/// Encodes a value to canonical CBOR.
///
/// The output is deterministic: heads use the shortest argument, lengths
/// are always definite, and map keys are ordered by their encoded bytes,
/// shorter keys first. Equal values always produce identical bytes, which
/// is what makes re-encode-and-compare a sound change check.
#[must_use]
pub fn to_canonical_cbor(value: &Value) -> Vec<u8> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value);
    encoder.into_bytes()
}

/// Orders encoded map keys: length first, then bytewise.
pub(crate) fn canonical_order(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sorts entries by encoded key and keeps the last entry of each duplicate run.
pub(crate) fn canonical_entries<T>(mut entries: Vec<(Vec<u8>, T)>) -> Vec<(Vec<u8>, T)> {
    entries.sort_by(|a, b| canonical_order(&a.0, &b.0));
    let mut out: Vec<(Vec<u8>, T)> = Vec::with_capacity(entries.len());
    for entry in entries {
        match out.last_mut() {
            Some(last) if last.0 == entry.0 => *last = entry,
            _ => out.push(entry),
        }
    }
    out
}

/// A reusable canonical CBOR writer.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    out: Vec<u8>,
}

impl CanonicalEncoder {
    /// Creates an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the encoding of `value`.
    pub fn encode(&mut self, value: &Value) {
        match value {
            Value::Null => self.out.push(0xf6),
            Value::Bool(false) => self.out.push(0xf4),
            Value::Bool(true) => self.out.push(0xf5),
            Value::Integer(n) if *n >= 0 => self.head(0, n.unsigned_abs()),
            // -1 - n, which is |n| - 1 for negative n
            Value::Integer(n) => self.head(1, n.unsigned_abs() - 1),
            Value::Bytes(bytes) => {
                self.head(2, bytes.len() as u64);
                self.out.extend_from_slice(bytes);
            }
            Value::Text(text) => {
                self.head(3, text.len() as u64);
                self.out.extend_from_slice(text.as_bytes());
            }
            Value::Array(items) => {
                self.head(4, items.len() as u64);
                for item in items {
                    self.encode(item);
                }
            }
            Value::Map(pairs) => {
                let keyed: Vec<(Vec<u8>, &Value)> = pairs
                    .iter()
                    .map(|(key, value)| (to_canonical_cbor(key), value))
                    .collect();
                let entries = canonical_entries(keyed);
                self.head(5, entries.len() as u64);
                for (key, value) in entries {
                    self.out.extend_from_slice(&key);
                    self.encode(value);
                }
            }
        }
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    /// Consumes the encoder, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    fn head(&mut self, major: u8, arg: u64) {
        let major = major << 5;
        if arg < 24 {
            self.out.push(major | arg as u8);
        } else if let Ok(arg) = u8::try_from(arg) {
            self.out.push(major | 24);
            self.out.push(arg);
        } else if let Ok(arg) = u16::try_from(arg) {
            self.out.push(major | 25);
            self.out.extend_from_slice(&arg.to_be_bytes());
        } else if let Ok(arg) = u32::try_from(arg) {
            self.out.push(major | 26);
            self.out.extend_from_slice(&arg.to_be_bytes());
        } else {
            self.out.push(major | 27);
            self.out.extend_from_slice(&arg.to_be_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_values() {
        assert_eq!(to_canonical_cbor(&Value::Null), [0xf6]);
        assert_eq!(to_canonical_cbor(&Value::Bool(false)), [0xf4]);
        assert_eq!(to_canonical_cbor(&Value::Bool(true)), [0xf5]);
    }

    #[test]
    fn integers_use_shortest_head() {
        assert_eq!(to_canonical_cbor(&Value::Integer(23)), [0x17]);
        assert_eq!(to_canonical_cbor(&Value::Integer(24)), [0x18, 24]);
        assert_eq!(to_canonical_cbor(&Value::Integer(256)), [0x19, 1, 0]);
        assert_eq!(to_canonical_cbor(&Value::Integer(65_536)), [0x1a, 0, 1, 0, 0]);
        assert_eq!(to_canonical_cbor(&Value::Integer(-1)), [0x20]);
        assert_eq!(to_canonical_cbor(&Value::Integer(-25)), [0x38, 24]);
        assert_eq!(
            to_canonical_cbor(&Value::Integer(i64::MIN)),
            [0x3b, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn strings_carry_length_head() {
        assert_eq!(to_canonical_cbor(&Value::from("foo")), [0x63, b'f', b'o', b'o']);
        assert_eq!(to_canonical_cbor(&Value::Bytes(vec![1, 2])), [0x42, 1, 2]);
    }

    #[test]
    fn raw_map_is_sorted_on_encode() {
        let unsorted = Value::Map(vec![
            ("bb".into(), 1.into()),
            ("a".into(), 2.into()),
        ]);
        let sorted = Value::map(vec![("a".into(), 2.into()), ("bb".into(), 1.into())]);
        assert_eq!(to_canonical_cbor(&unsorted), to_canonical_cbor(&sorted));
        assert_eq!(
            to_canonical_cbor(&sorted),
            [0xa2, 0x61, b'a', 0x02, 0x62, b'b', b'b', 0x01]
        );
    }

    #[test]
    fn encoder_appends_consecutive_items() {
        let mut encoder = CanonicalEncoder::new();
        encoder.encode(&Value::Integer(1));
        encoder.encode(&Value::Null);
        assert_eq!(encoder.as_bytes(), &[0x01, 0xf6]);
    }
}
