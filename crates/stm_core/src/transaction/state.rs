//! The nested transaction context.

use super::context::{Context, Shared};
use super::handle::{check_all, handle_entry, Access, HandleStatus, HandleTable};
use super::overlay::Overlay;
use super::Storable;
use crate::ambient;
use crate::error::{CoreError, CoreResult};
use crate::pointer::Ptr;
use crate::types::{BlobId, PointerId, TransactionId};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// A nested transaction over a parent [`Context`].
///
/// Typed access goes through [`Ptr`]s: the first [`get`](Self::get) of a
/// pointer decodes and caches its value; [`get_mut`](Self::get_mut) hands
/// out the cached value mutably and marks it dirty. At commit every cached
/// value is re-encoded and written back if it no longer matches its payload.
/// [`set`](Self::set) writes eagerly.
///
/// `commit` and `abort` consume the transaction. Dropping it without
/// committing discards the overlay.
pub struct Transaction<'p> {
    id: TransactionId,
    parent: &'p dyn Context,
    shared: &'p Shared,
    overlay: Mutex<Overlay>,
    attached: Mutex<HandleTable>,
    finished: bool,
}

impl<'p> Transaction<'p> {
    pub(crate) fn new(parent: &'p dyn Context) -> Self {
        let shared = parent.shared();
        let id = shared.next_transaction_id();
        shared.stats.record_transaction_start();
        debug!(txn = %id, parent = ?parent.transaction_id(), "transaction started");
        Self {
            id,
            parent,
            shared,
            overlay: Mutex::new(Overlay::default()),
            attached: Mutex::new(HandleTable::new()),
            finished: false,
        }
    }

    /// Returns the transaction id.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Allocates a pointer, visible as existing but unset until written.
    ///
    /// The id is allocated in the root so it is unique across all
    /// transactions; it stays allocated even if this transaction aborts.
    ///
    /// # Errors
    ///
    /// Propagates allocation failures of enclosing contexts.
    pub fn new_pointer<T: Storable>(&mut self) -> CoreResult<Ptr<T>> {
        let pointer = self.overlay.get_mut().allocate(self.parent)?;
        Ok(Ptr::from_id(pointer))
    }

    /// Returns the value behind `ptr`, loading and caching it on first use.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingPointer`] if the pointer does not exist
    /// - [`CoreError::Decode`] if the payload is not a `T`, or the pointer is
    ///   unset under [`UnsetPolicy::Reject`](crate::UnsetPolicy::Reject)
    /// - [`CoreError::HandleTypeMismatch`] if the pointer is cached as another type
    pub fn get<T: Storable>(&mut self, ptr: Ptr<T>) -> CoreResult<&T> {
        self.cached(ptr, false).map(|value| &*value)
    }

    /// Like [`get`](Self::get), returning the cached value mutably.
    ///
    /// Edits are written back as a new blob at commit (or before a child
    /// transaction opens) if the value re-encodes differently.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn get_mut<T: Storable>(&mut self, ptr: Ptr<T>) -> CoreResult<&mut T> {
        self.cached(ptr, true)
    }

    /// Applies `f` to the value behind `ptr` and returns its result.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn update<T: Storable, R>(&mut self, ptr: Ptr<T>, f: impl FnOnce(&mut T) -> R) -> CoreResult<R> {
        Ok(f(self.get_mut(ptr)?))
    }

    /// Encodes `value`, writes it as a new blob and repoints `ptr` in this
    /// transaction's overlay.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingPointer`] if the pointer does not exist
    /// - [`CoreError::Encode`] if the value cannot be encoded
    pub fn set<T: Storable>(&mut self, ptr: Ptr<T>, value: T) -> CoreResult<()> {
        let pointer = ptr.id();
        self.ensure_exists(pointer)?;
        let mut access = Access {
            parent: self.parent,
            overlay: self.overlay.get_mut(),
            shared: self.shared,
        };
        handle_entry::<T>(self.attached.get_mut(), pointer)?.set_value(&mut access, value)
    }

    /// Reads the raw payload behind `pointer`, or `None` if it is unset.
    ///
    /// Bypasses the handle cache: in-place edits not yet checked are not
    /// visible here.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPointer`] or [`CoreError::MissingBlob`].
    pub fn read_raw(&mut self, pointer: PointerId) -> CoreResult<Option<Vec<u8>>> {
        let blob = self.overlay.get_mut().read(self.parent, pointer)?;
        if blob.is_unset() {
            return Ok(None);
        }
        self.shared
            .blobs
            .read(blob)?
            .map(Some)
            .ok_or(CoreError::MissingBlob { blob })
    }

    /// Writes a raw payload behind `pointer`, dropping any cached value for it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPointer`] or a storage error.
    pub fn write_raw(&mut self, pointer: PointerId, payload: &[u8]) -> CoreResult<BlobId> {
        self.ensure_exists(pointer)?;
        self.attached.get_mut().remove(&pointer);
        let mut access = Access {
            parent: self.parent,
            overlay: self.overlay.get_mut(),
            shared: self.shared,
        };
        access.store(pointer, payload)
    }

    /// State of the cached handle for `pointer`.
    #[must_use]
    pub fn handle_status(&self, pointer: impl Into<PointerId>) -> HandleStatus {
        self.attached
            .lock()
            .get(&pointer.into())
            .map_or(HandleStatus::Unbound, |handle| handle.status())
    }

    /// Pointers read from the parent with the blob first observed.
    #[must_use]
    pub fn read_set(&self) -> Vec<(PointerId, BlobId)> {
        self.overlay.lock().reads.iter().map(|(&p, &b)| (p, b)).collect()
    }

    /// Pending pointer writes.
    #[must_use]
    pub fn write_set(&self) -> Vec<(PointerId, BlobId)> {
        self.overlay.lock().writes.iter().map(|(&p, &b)| (p, b)).collect()
    }

    /// Opens a child transaction.
    ///
    /// Changed handles are written back first (unless disabled with
    /// [`Config::flush_before_nested`](crate::Config::flush_before_nested)) so
    /// the child observes in-place edits.
    ///
    /// # Errors
    ///
    /// Returns an encode or storage error from the write-back.
    pub fn begin(&self) -> CoreResult<Transaction<'_>> {
        if self.shared.config.flush_before_nested {
            let mut attached = self.attached.lock();
            let mut overlay = self.overlay.lock();
            let mut access = Access {
                parent: self.parent,
                overlay: &mut overlay,
                shared: self.shared,
            };
            check_all(&mut attached, &mut access)?;
        }
        Ok(Transaction::new(self))
    }

    /// Runs `f` in a child transaction and commits it into this one.
    ///
    /// # Errors
    ///
    /// Returns the body's error (the child is discarded) or the child's
    /// commit error.
    pub fn transact<R>(&self, f: impl FnOnce(&mut Transaction<'_>) -> CoreResult<R>) -> CoreResult<R> {
        let child = self.begin()?;
        run(child, f)
    }

    /// Writes back changed handles and merges this transaction into its parent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conflict`] if a pointer this transaction read
    /// has since been repointed in the parent. The parent is unchanged.
    pub fn commit(mut self) -> CoreResult<()> {
        self.finished = true;
        let result = self.commit_inner();
        let stats = &self.shared.stats;
        match &result {
            Ok(()) => {
                stats.record_transaction_commit();
                debug!(txn = %self.id, "transaction committed");
            }
            Err(err) => {
                if err.is_conflict() {
                    stats.record_conflict();
                }
                stats.record_transaction_abort();
                debug!(txn = %self.id, %err, "commit failed");
            }
        }
        result
    }

    /// Discards the overlay without touching the parent.
    pub fn abort(mut self) {
        self.finished = true;
        self.shared.stats.record_transaction_abort();
        debug!(txn = %self.id, "transaction aborted");
    }

    fn commit_inner(&mut self) -> CoreResult<()> {
        let mut access = Access {
            parent: self.parent,
            overlay: self.overlay.get_mut(),
            shared: self.shared,
        };
        let flushed = check_all(self.attached.get_mut(), &mut access)?;
        let overlay = std::mem::take(self.overlay.get_mut());
        self.attached.get_mut().clear();
        debug!(
            txn = %self.id,
            reads = overlay.reads.len(),
            writes = overlay.writes.len(),
            flushed,
            "committing"
        );
        self.parent
            .commit_child(self.id, &overlay.reads, &overlay.writes)
    }

    fn cached<T: Storable>(&mut self, ptr: Ptr<T>, dirty: bool) -> CoreResult<&mut T> {
        let mut access = Access {
            parent: self.parent,
            overlay: self.overlay.get_mut(),
            shared: self.shared,
        };
        handle_entry::<T>(self.attached.get_mut(), ptr.id())?.value(&mut access, dirty)
    }

    fn ensure_exists(&mut self, pointer: PointerId) -> CoreResult<()> {
        if self.overlay.get_mut().contains(self.parent, pointer) {
            Ok(())
        } else {
            Err(CoreError::MissingPointer { pointer })
        }
    }
}

/// Runs `f` inside `txn` with `txn` installed as the ambient transaction,
/// committing on success and discarding on error.
pub(crate) fn run<R>(
    mut txn: Transaction<'_>,
    f: impl FnOnce(&mut Transaction<'_>) -> CoreResult<R>,
) -> CoreResult<R> {
    let _scope = ambient::enter(txn.id);
    match f(&mut txn) {
        Ok(value) => {
            txn.commit()?;
            Ok(value)
        }
        Err(err) => {
            debug!(txn = %txn.id, %err, "transaction body failed");
            txn.abort();
            Err(err)
        }
    }
}

impl Context for Transaction<'_> {
    fn shared(&self) -> &Shared {
        self.shared
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        Some(self.id)
    }

    fn read_pointer(&self, pointer: PointerId) -> CoreResult<BlobId> {
        self.overlay.lock().read(self.parent, pointer)
    }

    fn contains_pointer(&self, pointer: PointerId) -> bool {
        self.overlay.lock().contains(self.parent, pointer)
    }

    fn allocate_pointer(&self) -> CoreResult<PointerId> {
        self.overlay.lock().allocate(self.parent)
    }

    fn commit_child(
        &self,
        child: TransactionId,
        reads: &BTreeMap<PointerId, BlobId>,
        writes: &BTreeMap<PointerId, BlobId>,
    ) -> CoreResult<()> {
        let mut overlay = self.overlay.lock();
        for (&pointer, &observed) in reads {
            let current = overlay.read(self.parent, pointer)?;
            if current != observed {
                return Err(CoreError::Conflict {
                    pointer,
                    observed,
                    current,
                });
            }
        }
        for (&pointer, &blob) in writes {
            overlay.write(pointer, blob);
        }
        drop(overlay);

        // Cached values for pointers the child wrote are stale now.
        let mut attached = self.attached.lock();
        for pointer in writes.keys() {
            attached.remove(pointer);
        }
        debug!(txn = %self.id, %child, writes = writes.len(), "child merged");
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.stats.record_transaction_abort();
            debug!(txn = %self.id, "transaction dropped without commit");
        }
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("parent", &self.parent.transaction_id())
            .field("overlay", &*self.overlay.lock())
            .finish_non_exhaustive()
    }
}
