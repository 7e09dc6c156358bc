//! # STM Storage
//!
//! Byte-level storage primitives used by the STM engine and its tooling.
//!
//! Nothing in this crate knows about pointers, transactions or codecs.
//! It offers two families of primitives:
//!
//! - **Backends** ([`StorageBackend`]): opaque append-only byte stores with
//!   positional reads. [`InMemoryBackend`] is used in tests and ephemeral
//!   engines, [`FileBackend`] for blob logs that outlive the process.
//! - **Standalone files**: [`MappedArrayFile`] (fixed-width i32/i64 arrays
//!   behind a memory map), [`AppendFile`] (buffered fixed-width append log)
//!   and [`SequenceFile`] (length-prefixed variable records).
//!
//! Positions handed out by the standalone files are element or record
//! indices, never byte offsets.
//!
//! ## Example
//!
//! ```rust
//! use stm_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"blob payload").unwrap();
//! assert_eq!(backend.read_at(offset, 4).unwrap(), b"blob");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod append;
mod backend;
mod element;
mod error;
mod file;
mod mapped;
mod memory;
mod mmap;
mod sequence;

pub use append::{AppendFile, IntAppendFile};
pub use backend::StorageBackend;
pub use element::Element;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use mapped::{IntArrayFile, LongArrayFile, MappedArrayFile};
pub use memory::InMemoryBackend;
pub use sequence::{SequenceFile, RECORD_HEADER_SIZE};
