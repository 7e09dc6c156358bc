//! Canonical CBOR decoder.

use crate::encoder::canonical_order;
use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use std::cmp::Ordering;

/// Largest element count accepted for arrays and maps.
const MAX_CONTAINER_ELEMENTS: u64 = 16 * 1024 * 1024;

/// Largest byte or text string accepted.
const MAX_BYTES_LENGTH: u64 = 256 * 1024 * 1024;

/// Deepest nesting accepted.
const MAX_DEPTH: u64 = 128;

/// Decodes exactly one canonical value occupying all of `bytes`.
///
/// # Errors
///
/// Returns an error for malformed input, constructs outside [`Value`]
/// (floats, tags, undefined), any non-canonical form, or trailing bytes.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = CanonicalDecoder::new(bytes);
    let value = decoder.decode()?;
    match decoder.remaining().len() {
        0 => Ok(value),
        count => Err(CodecError::TrailingBytes { count }),
    }
}

/// A strict decoder that accepts only the canonical form of each value.
#[derive(Debug)]
pub struct CanonicalDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: u64,
}

impl<'a> CanonicalDecoder<'a> {
    /// Creates a decoder over `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    /// Returns `true` when all input has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the unconsumed input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Decodes the next value.
    ///
    /// # Errors
    ///
    /// See [`from_cbor`].
    pub fn decode(&mut self) -> CodecResult<Value> {
        let initial = self.byte()?;
        let (major, info) = (initial >> 5, initial & 0x1f);
        match major {
            0 => {
                let n = self.argument(info)?;
                i64::try_from(n)
                    .map(Value::Integer)
                    .map_err(|_| CodecError::IntegerOverflow)
            }
            1 => {
                let n = self.argument(info)?;
                i64::try_from(n)
                    .map(|n| Value::Integer(-1 - n))
                    .map_err(|_| CodecError::IntegerOverflow)
            }
            2 => {
                let len = self.length(info, MAX_BYTES_LENGTH)?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }
            3 => {
                let len = self.length(info, MAX_BYTES_LENGTH)?;
                let text = std::str::from_utf8(self.take(len)?).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(Value::Text(text.to_string()))
            }
            4 => {
                let len = self.length(info, MAX_CONTAINER_ELEMENTS)?;
                self.nested(|d| {
                    let mut items = Vec::with_capacity(len.min(1024));
                    for _ in 0..len {
                        items.push(d.decode()?);
                    }
                    Ok(Value::Array(items))
                })
            }
            5 => {
                let len = self.length(info, MAX_CONTAINER_ELEMENTS)?;
                self.nested(|d| d.map_entries(len))
            }
            6 => Err(CodecError::unsupported_type("tag")),
            _ => match info {
                20 => Ok(Value::Bool(false)),
                21 => Ok(Value::Bool(true)),
                22 => Ok(Value::Null),
                25..=27 => Err(CodecError::FloatForbidden),
                31 => Err(CodecError::IndefiniteLengthForbidden),
                other => Err(CodecError::unsupported_type(format!("simple value {other}"))),
            },
        }
    }

    fn map_entries(&mut self, len: usize) -> CodecResult<Value> {
        let mut pairs = Vec::with_capacity(len.min(1024));
        let mut previous: Option<&'a [u8]> = None;
        for _ in 0..len {
            let start = self.pos;
            let key = self.decode()?;
            let data = self.data;
            let encoded = &data[start..self.pos];
            if let Some(prev) = previous {
                match canonical_order(prev, encoded) {
                    Ordering::Less => {}
                    Ordering::Equal => return Err(CodecError::non_canonical("duplicate map key")),
                    Ordering::Greater => {
                        return Err(CodecError::non_canonical("map keys out of order"))
                    }
                }
            }
            previous = Some(encoded);
            pairs.push((key, self.decode()?));
        }
        Ok(Value::Map(pairs))
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self) -> CodecResult<Value>) -> CodecResult<Value> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CodecError::SizeLimitExceeded {
                claimed: self.depth,
                max_allowed: MAX_DEPTH,
            });
        }
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn byte(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        let bytes = self.data.get(self.pos..end).ok_or(CodecError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    fn length(&mut self, info: u8, max_allowed: u64) -> CodecResult<usize> {
        let claimed = self.argument(info)?;
        if claimed > max_allowed {
            return Err(CodecError::SizeLimitExceeded {
                claimed,
                max_allowed,
            });
        }
        usize::try_from(claimed).map_err(|_| CodecError::IntegerOverflow)
    }

    fn argument(&mut self, info: u8) -> CodecResult<u64> {
        let (value, floor) = match info {
            0..=23 => return Ok(u64::from(info)),
            24 => (u64::from(self.byte()?), 24),
            25 => (self.be_uint(2)?, 1 << 8),
            26 => (self.be_uint(4)?, 1 << 16),
            27 => (self.be_uint(8)?, 1 << 32),
            31 => return Err(CodecError::IndefiniteLengthForbidden),
            _ => return Err(CodecError::decoding_failed(format!("reserved additional info {info}"))),
        };
        if value < floor {
            return Err(CodecError::non_canonical("argument not in shortest form"));
        }
        Ok(value)
    }

    fn be_uint(&mut self, width: usize) -> CodecResult<u64> {
        Ok(self
            .take(width)?
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }
}
