//! The operations a transaction needs from its parent.

use crate::blob::BlobStore;
use crate::config::Config;
use crate::error::CoreResult;
use crate::stats::StmStats;
use crate::types::{BlobId, PointerId, TransactionId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use stm_codec::Codec;

/// Engine-wide collaborators reachable from every context.
pub struct Shared {
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) codec: Arc<dyn Codec>,
    pub(crate) config: Config,
    pub(crate) stats: StmStats,
    next_txn: AtomicU64,
}

impl Shared {
    pub(crate) fn new(config: Config, blobs: Arc<dyn BlobStore>, codec: Arc<dyn Codec>) -> Self {
        Self {
            blobs,
            codec,
            config,
            stats: StmStats::new(),
            next_txn: AtomicU64::new(1),
        }
    }

    /// The blob store every context writes into.
    #[must_use]
    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    /// The payload codec.
    #[must_use]
    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The engine counters.
    #[must_use]
    pub fn stats(&self) -> &StmStats {
        &self.stats
    }

    pub(crate) fn next_transaction_id(&self) -> TransactionId {
        TransactionId(self.next_txn.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("blobs", &self.blobs.len())
            .field("codec", &self.codec.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A context transactions can be opened against.
///
/// Implemented by the root [`Stm`](crate::Stm) and by
/// [`Transaction`](crate::Transaction). The root has no parent, so it has no
/// `commit`; only nested transactions do.
pub trait Context: Send + Sync {
    /// Engine-wide collaborators.
    fn shared(&self) -> &Shared;

    /// This context's transaction id, or `None` for the root.
    fn transaction_id(&self) -> Option<TransactionId>;

    /// Returns the blob `pointer` targets as seen from this context.
    ///
    /// Nested contexts record the observation for validation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPointer`](crate::CoreError::MissingPointer)
    /// for unallocated pointers.
    fn read_pointer(&self, pointer: PointerId) -> CoreResult<BlobId>;

    /// Returns `true` if `pointer` exists as seen from this context. Not recorded.
    fn contains_pointer(&self, pointer: PointerId) -> bool;

    /// Allocates a globally unique pointer visible from this context.
    ///
    /// # Errors
    ///
    /// Propagates failures of the enclosing contexts.
    fn allocate_pointer(&self) -> CoreResult<PointerId>;

    /// Validates a child's reads against this context and applies its writes,
    /// atomically with respect to other children of this context.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conflict`](crate::CoreError::Conflict) naming the
    /// first pointer whose target moved; nothing is applied in that case.
    fn commit_child(
        &self,
        child: TransactionId,
        reads: &BTreeMap<PointerId, BlobId>,
        writes: &BTreeMap<PointerId, BlobId>,
    ) -> CoreResult<()>;
}
