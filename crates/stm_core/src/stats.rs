//! Engine statistics.
//!
//! ```rust
//! use stm_core::Stm;
//!
//! let stm = Stm::new();
//! stm.transact(|txn| txn.set(stm.root::<u32>(), 1)).unwrap();
//! let stats = stm.stats();
//! assert_eq!(stats.transactions_committed, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every transaction of one engine.
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct StmStats {
    transactions_started: AtomicU64,
    transactions_committed: AtomicU64,
    transactions_aborted: AtomicU64,
    conflicts: AtomicU64,
    blobs_written: AtomicU64,
    bytes_written: AtomicU64,
    handle_flushes: AtomicU64,
}

impl StmStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_transaction_start(&self) {
        self.transactions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_commit(&self) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transaction_abort(&self) {
        self.transactions_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_blob_write(&self, bytes: u64) {
        self.blobs_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records a handle whose re-encoded value was written at check time.
    pub(crate) fn record_handle_flush(&self) {
        self.handle_flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of transactions begun.
    pub fn transactions_started(&self) -> u64 {
        self.transactions_started.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions committed.
    pub fn transactions_committed(&self) -> u64 {
        self.transactions_committed.load(Ordering::Relaxed)
    }

    /// Returns the number of transactions aborted, including failed commits.
    pub fn transactions_aborted(&self) -> u64 {
        self.transactions_aborted.load(Ordering::Relaxed)
    }

    /// Returns the number of commits rejected by validation.
    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Returns the number of blobs written.
    pub fn blobs_written(&self) -> u64 {
        self.blobs_written.load(Ordering::Relaxed)
    }

    /// Returns the payload bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Returns the number of in-place edits captured at check time.
    pub fn handle_flushes(&self) -> u64 {
        self.handle_flushes.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            transactions_started: self.transactions_started(),
            transactions_committed: self.transactions_committed(),
            transactions_aborted: self.transactions_aborted(),
            conflicts: self.conflicts(),
            blobs_written: self.blobs_written(),
            bytes_written: self.bytes_written(),
            handle_flushes: self.handle_flushes(),
        }
    }
}

/// A point-in-time copy of [`StmStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Transactions begun.
    pub transactions_started: u64,
    /// Transactions committed.
    pub transactions_committed: u64,
    /// Transactions aborted.
    pub transactions_aborted: u64,
    /// Commits rejected by validation.
    pub conflicts: u64,
    /// Blobs written.
    pub blobs_written: u64,
    /// Payload bytes written.
    pub bytes_written: u64,
    /// In-place edits captured at check time.
    pub handle_flushes: u64,
}
