//! The root context.

use crate::blob::{BlobStore, MemoryBlobStore};
use crate::config::{Config, UnsetPolicy};
use crate::error::{CoreError, CoreResult};
use crate::pointer::{PointerTable, Ptr};
use crate::stats::StatsSnapshot;
use crate::transaction::{run, Context, Shared, Storable, Transaction};
use crate::types::{BlobId, PointerId, Revision, TransactionId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use stm_codec::{decode_with, encode_with, CanonicalCbor, Codec, Value};
use tracing::debug;

/// The root of an STM engine.
///
/// `Stm` owns the shared blob store and pointer table. It writes straight
/// through to them; everything transactional happens in a [`Transaction`]
/// opened with [`begin`](Self::begin) or [`transact`](Self::transact).
///
/// The root has no parent, so it has no `commit`.
///
/// # Example
///
/// ```rust
/// use stm_core::Stm;
///
/// let stm = Stm::new();
/// let counter = stm.init_root(&0u64).unwrap();
///
/// stm.transact(|txn| {
///     *txn.get_mut(counter)? += 1;
///     Ok(())
/// })
/// .unwrap();
///
/// assert_eq!(stm.load(counter).unwrap(), 1);
/// ```
pub struct Stm {
    shared: Shared,
    pointers: PointerTable,
}

impl Stm {
    /// Creates an in-memory engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an in-memory engine with the canonical CBOR codec.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self::open(config, Arc::new(MemoryBlobStore::new()), Arc::new(CanonicalCbor))
    }

    /// Creates an engine over the given blob store and codec.
    ///
    /// The pointer table always starts empty; only [`PointerId::ROOT`] is
    /// allocated.
    pub fn open(config: Config, blobs: Arc<dyn BlobStore>, codec: Arc<dyn Codec>) -> Self {
        let pointers = PointerTable::new();
        let root = pointers.new_pointer();
        debug_assert_eq!(root, PointerId::ROOT);
        debug!(
            codec = codec.name(),
            blobs = blobs.len(),
            ?config,
            "stm opened"
        );
        Self {
            shared: Shared::new(config, blobs, codec),
            pointers,
        }
    }

    /// The root pointer, typed as `T`.
    #[must_use]
    pub fn root<T>(&self) -> Ptr<T> {
        Ptr::from_id(PointerId::ROOT)
    }

    /// Stores `value` behind the root pointer and returns it typed.
    ///
    /// # Errors
    ///
    /// Returns an encode or storage error.
    pub fn init_root<T: Storable>(&self, value: &T) -> CoreResult<Ptr<T>> {
        let root = self.root();
        self.store(root, value)?;
        Ok(root)
    }

    /// Allocates a pointer directly in the root table.
    #[must_use]
    pub fn new_pointer<T>(&self) -> Ptr<T> {
        Ptr::from_id(self.pointers.new_pointer())
    }

    /// Decodes the committed value behind `ptr`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPointer`], [`CoreError::MissingBlob`] or
    /// [`CoreError::Decode`].
    pub fn load<T: Storable>(&self, ptr: Ptr<T>) -> CoreResult<T> {
        let pointer = ptr.id();
        let payload = match self.read_raw(pointer)? {
            Some(payload) => payload,
            None => match self.shared.config.unset_reads {
                UnsetPolicy::Reject => return Err(CoreError::unset(pointer)),
                UnsetPolicy::DecodeAsNull => self
                    .shared
                    .codec
                    .encode(&Value::Null)
                    .map_err(|source| CoreError::Decode { pointer, source })?,
            },
        };
        decode_with(self.shared.codec(), &payload)
            .map_err(|source| CoreError::Decode { pointer, source })
    }

    /// Encodes `value` and repoints `ptr` at it outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPointer`], an encode or storage error.
    pub fn store<T: Storable>(&self, ptr: Ptr<T>, value: &T) -> CoreResult<BlobId> {
        let pointer = ptr.id();
        let payload = encode_with(self.shared.codec(), value)
            .map_err(|source| CoreError::Encode { pointer, source })?;
        self.write_raw(pointer, &payload)
    }

    /// Reads the raw payload behind `pointer`, or `None` if it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPointer`] or [`CoreError::MissingBlob`].
    pub fn read_raw(&self, pointer: PointerId) -> CoreResult<Option<Vec<u8>>> {
        let blob = self.pointers.get(pointer)?;
        if blob.is_unset() {
            return Ok(None);
        }
        self.shared
            .blobs
            .read(blob)?
            .map(Some)
            .ok_or(CoreError::MissingBlob { blob })
    }

    /// Writes `payload` as a new blob and repoints `pointer` at it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPointer`] or a storage error. The blob is
    /// written before the pointer is checked.
    pub fn write_raw(&self, pointer: PointerId, payload: &[u8]) -> CoreResult<BlobId> {
        if !self.pointers.contains(pointer) {
            return Err(CoreError::MissingPointer { pointer });
        }
        let blob = self.shared.blobs.write(payload)?;
        self.shared.stats.record_blob_write(payload.len() as u64);
        self.pointers.set(pointer, blob)?;
        debug!(%pointer, %blob, len = payload.len(), "root pointer written");
        Ok(blob)
    }

    /// Opens a transaction against the root.
    #[must_use]
    pub fn begin(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Runs `f` in a new transaction, committing if it returns `Ok`.
    ///
    /// The transaction is installed as the [ambient](crate::ambient)
    /// transaction for the duration of `f`. If `f` fails, nothing it wrote
    /// reaches the root.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or the commit error (typically
    /// [`CoreError::Conflict`]).
    pub fn transact<R>(&self, f: impl FnOnce(&mut Transaction<'_>) -> CoreResult<R>) -> CoreResult<R> {
        run(self.begin(), f)
    }

    /// Like [`transact`](Self::transact), rerunning `f` from scratch after a
    /// conflict, up to [`Config::max_attempts`] times.
    ///
    /// # Errors
    ///
    /// Returns the first non-conflict error, or the last conflict once the
    /// attempts are spent.
    pub fn transact_with_retry<R>(
        &self,
        mut f: impl FnMut(&mut Transaction<'_>) -> CoreResult<R>,
    ) -> CoreResult<R> {
        let attempts = self.shared.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.transact(&mut f) {
                Err(err) if err.is_conflict() && attempt < attempts => {
                    debug!(attempt, %err, "retrying after conflict");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// The root pointer table.
    #[must_use]
    pub fn pointers(&self) -> &PointerTable {
        &self.pointers
    }

    /// The blob store.
    #[must_use]
    pub fn blobs(&self) -> &dyn BlobStore {
        self.shared.blobs()
    }

    /// The payload codec.
    #[must_use]
    pub fn codec(&self) -> &dyn Codec {
        self.shared.codec()
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        self.shared.config()
    }

    /// Current revision of the root pointer table.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.pointers.revision()
    }

    /// Snapshot of the engine counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }
}

impl Default for Stm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Stm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stm")
            .field("shared", &self.shared)
            .field("pointers", &self.pointers.len())
            .field("revision", &self.pointers.revision())
            .finish()
    }
}

impl Context for Stm {
    fn shared(&self) -> &Shared {
        &self.shared
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        None
    }

    fn read_pointer(&self, pointer: PointerId) -> CoreResult<BlobId> {
        self.pointers.get(pointer)
    }

    fn contains_pointer(&self, pointer: PointerId) -> bool {
        self.pointers.contains(pointer)
    }

    fn allocate_pointer(&self) -> CoreResult<PointerId> {
        Ok(self.pointers.new_pointer())
    }

    fn commit_child(
        &self,
        child: TransactionId,
        reads: &BTreeMap<PointerId, BlobId>,
        writes: &BTreeMap<PointerId, BlobId>,
    ) -> CoreResult<()> {
        self.pointers.validate_and_apply(reads, writes)?;
        debug!(%child, revision = %self.pointers.revision(), "committed to root");
        Ok(())
    }
}
