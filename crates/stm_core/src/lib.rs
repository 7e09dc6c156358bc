//! # STM Core
//!
//! A minimal software transactional memory engine.
//!
//! Values live in an append-only blob store. A pointer table maps stable
//! pointer ids to the blob currently holding each value, so writing a value
//! means writing a new blob and repointing. Transactions buffer pointer
//! writes in a private overlay, remember the blob they first observed for
//! each pointer they read, and on commit validate those observations
//! against their parent before applying the writes atomically.
//!
//! This crate provides:
//! - Blob stores ([`MemoryBlobStore`], and [`LogBlobStore`] over any storage backend)
//! - The root [`PointerTable`] and typed [`Ptr`]s
//! - The root context [`Stm`] and nested [`Transaction`]s
//! - Cached, dirty-tracking handles behind [`Transaction::get`] and [`Transaction::get_mut`]
//! - The per-thread [`ambient`] transaction slot
//!
//! ## Example
//!
//! ```rust
//! use stm_core::{Ptr, Stm};
//! use std::collections::HashMap;
//!
//! let stm = Stm::new();
//! let registry = stm.init_root(&HashMap::<String, Ptr<String>>::new()).unwrap();
//!
//! stm.transact(|txn| {
//!     let name = txn.new_pointer::<String>()?;
//!     txn.set(name, "foo".to_string())?;
//!     txn.get_mut(registry)?.insert("test".into(), name);
//!     Ok(())
//! })
//! .unwrap();
//!
//! let value = stm
//!     .transact(|txn| {
//!         let name = txn.get(registry)?["test"];
//!         Ok(txn.get(name)?.clone())
//!     })
//!     .unwrap();
//! assert_eq!(value, "foo");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ambient;
mod blob;
mod config;
mod error;
mod pointer;
mod stats;
mod stm;
mod transaction;
mod types;

pub use blob::{BlobStore, LogBlobStore, MemoryBlobStore};
pub use config::{Config, UnsetPolicy};
pub use error::{CoreError, CoreResult};
pub use pointer::{PointerTable, Ptr};
pub use stats::{StatsSnapshot, StmStats};
pub use stm::Stm;
pub use transaction::{Context, HandleStatus, Shared, Storable, Transaction};
pub use types::{BlobId, PointerId, Revision, TransactionId};

pub use stm_codec::{CanonicalCbor, Codec, CodecError, Value};
