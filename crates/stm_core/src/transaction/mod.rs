//! Nested optimistic transactions.
//!
//! A [`Transaction`] buffers pointer writes in a private overlay and
//! remembers the blob id it first observed for every pointer it read from
//! its parent. On commit it:
//!
//! 1. checks every attached handle, writing back values edited in place
//! 2. asks the parent to validate the observed blob ids and apply the
//!    writes, as one atomic step against that parent
//!
//! A failed validation leaves the parent untouched and reports the pointer
//! that moved. Nothing is retried automatically; see
//! [`Stm::transact_with_retry`](crate::Stm::transact_with_retry) for an
//! opt-in loop.
//!
//! ```rust
//! use stm_core::Stm;
//! use std::collections::BTreeMap;
//!
//! let stm = Stm::new();
//! let root = stm.init_root(&BTreeMap::<String, u32>::new()).unwrap();
//!
//! stm.transact(|txn| {
//!     txn.get_mut(root)?.insert("visits".into(), 1);
//!     Ok(())
//! })
//! .unwrap();
//!
//! let visits = stm.transact(|txn| Ok(txn.get(root)?["visits"])).unwrap();
//! assert_eq!(visits, 1);
//! ```

mod context;
mod handle;
mod overlay;
mod state;

pub use context::{Context, Shared};
pub use handle::HandleStatus;
pub use state::Transaction;

pub(crate) use state::run;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Values that can live behind a pointer.
pub trait Storable: Serialize + DeserializeOwned + Send + 'static {}

impl<T: Serialize + DeserializeOwned + Send + 'static> Storable for T {}
