//! Conversion between serde types and [`Value`].

use crate::codec::Codec;
use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use ciborium::value::Value as CborValue;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serializes a typed value into a [`Value`].
///
/// # Errors
///
/// Returns an encoding error for shapes `Value` cannot hold, such as
/// floats or integers beyond the `i64` range.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> CodecResult<Value> {
    let cbor = CborValue::serialized(value).map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Value::try_from(cbor)
}

/// Deserializes a typed value out of a [`Value`].
///
/// # Errors
///
/// Returns a decoding error if the value does not have the shape `T` expects.
pub fn from_value<T: DeserializeOwned>(value: Value) -> CodecResult<T> {
    CborValue::from(value)
        .deserialized()
        .map_err(|e| CodecError::decoding_failed(e.to_string()))
}

/// Serializes `value` and encodes it with `codec`.
///
/// # Errors
///
/// See [`to_value`] and [`Codec::encode`].
pub fn encode_with<T: Serialize + ?Sized>(codec: &dyn Codec, value: &T) -> CodecResult<Vec<u8>> {
    codec.encode(&to_value(value)?)
}

/// Decodes `bytes` with `codec` and deserializes the result.
///
/// # Errors
///
/// See [`Codec::decode`] and [`from_value`].
pub fn decode_with<T: DeserializeOwned>(codec: &dyn Codec, bytes: &[u8]) -> CodecResult<T> {
    from_value(codec.decode(bytes)?)
}

impl TryFrom<CborValue> for Value {
    type Error = CodecError;

    fn try_from(cbor: CborValue) -> CodecResult<Self> {
        Ok(match cbor {
            CborValue::Null => Value::Null,
            CborValue::Bool(b) => Value::Bool(b),
            CborValue::Integer(n) => {
                Value::Integer(i64::try_from(i128::from(n)).map_err(|_| CodecError::IntegerOverflow)?)
            }
            CborValue::Bytes(bytes) => Value::Bytes(bytes),
            CborValue::Text(text) => Value::Text(text),
            CborValue::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<CodecResult<_>>()?,
            ),
            CborValue::Map(pairs) => Value::map(
                pairs
                    .into_iter()
                    .map(|(k, v)| Ok((Value::try_from(k)?, Value::try_from(v)?)))
                    .collect::<CodecResult<_>>()?,
            ),
            CborValue::Float(_) => return Err(CodecError::FloatForbidden),
            CborValue::Tag(tag, _) => return Err(CodecError::unsupported_type(format!("tag {tag}"))),
            _ => return Err(CodecError::unsupported_type("unknown CBOR value")),
        })
    }
}

impl From<Value> for CborValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CborValue::Null,
            Value::Bool(b) => CborValue::Bool(b),
            Value::Integer(n) => CborValue::Integer(n.into()),
            Value::Bytes(bytes) => CborValue::Bytes(bytes),
            Value::Text(text) => CborValue::Text(text),
            Value::Array(items) => CborValue::Array(items.into_iter().map(CborValue::from).collect()),
            Value::Map(pairs) => CborValue::Map(
                pairs
                    .into_iter()
                    .map(|(k, v)| (CborValue::from(k), CborValue::from(v)))
                    .collect(),
            ),
        }
    }
}
