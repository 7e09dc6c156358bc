//! # STM Codec
//!
//! The payload codec for the STM engine.
//!
//! The engine stores every value as an immutable blob and detects in-place
//! edits by re-encoding a cached value and comparing bytes with what was
//! read. That only works if equal values always encode identically, so the
//! default codec is strict canonical CBOR:
//!
//! - Map keys are sorted by their encoded bytes, shorter keys first
//! - Integers and lengths use the shortest head
//! - No floats, tags, or indefinite-length items
//! - Decoding rejects anything that is not already canonical
//!
//! Typed values reach [`Value`] through serde ([`to_value`], [`from_value`]),
//! and the engine talks to the byte format only through the [`Codec`] trait.
//!
//! ## Usage
//!
//! ```
//! use stm_codec::{decode_with, encode_with, CanonicalCbor};
//! use std::collections::HashMap;
//!
//! let mut registry = HashMap::new();
//! registry.insert("test".to_string(), 1u32);
//!
//! let bytes = encode_with(&CanonicalCbor, &registry).unwrap();
//! let back: HashMap<String, u32> = decode_with(&CanonicalCbor, &bytes).unwrap();
//! assert_eq!(back, registry);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod codec;
mod decoder;
mod encoder;
mod error;
mod value;

pub use bridge::{decode_with, encode_with, from_value, to_value};
pub use codec::{CanonicalCbor, Codec};
pub use decoder::{from_cbor, CanonicalDecoder};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use value::Value;
