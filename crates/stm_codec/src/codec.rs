//! The codec capability injected into the engine.

use crate::decoder::from_cbor;
use crate::encoder::to_canonical_cbor;
use crate::error::CodecResult;
use crate::value::Value;
use std::fmt;

/// Turns [`Value`]s into payload bytes and back.
///
/// The engine only relies on round-tripping: `decode(encode(v)) == v` for
/// every value the codec accepts. Implementations that also encode
/// deterministically let unchanged cached values skip a blob write at
/// commit.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Short name for logs and tooling.
    fn name(&self) -> &'static str;

    /// Encodes a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value's shape is not supported.
    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>>;

    /// Decodes a payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is malformed.
    fn decode(&self, bytes: &[u8]) -> CodecResult<Value>;
}

/// The default codec: strict canonical CBOR.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalCbor;

impl Codec for CanonicalCbor {
    fn name(&self) -> &'static str {
        "canonical-cbor"
    }

    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        Ok(to_canonical_cbor(value))
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value> {
        from_cbor(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodecError;

    #[test]
    fn canonical_cbor_through_trait_object() {
        let codec: &dyn Codec = &CanonicalCbor;
        let value = Value::map(vec![("test".into(), 7.into())]);
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), value);
        assert_eq!(codec.name(), "canonical-cbor");
    }

    #[test]
    fn canonical_cbor_rejects_garbage() {
        assert_eq!(
            CanonicalCbor.decode(&[0x01, 0x01]),
            Err(CodecError::TrailingBytes { count: 1 })
        );
    }
}
