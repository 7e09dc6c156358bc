//! Typed, cached views over single pointers.

use super::context::{Context, Shared};
use super::overlay::Overlay;
use super::Storable;
use crate::config::UnsetPolicy;
use crate::error::{CoreError, CoreResult};
use crate::types::{BlobId, PointerId};
use std::any::Any;
use std::collections::BTreeMap;
use stm_codec::{decode_with, encode_with, Value};
use tracing::debug;

/// Observable state of a pointer's handle within one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStatus {
    /// Nothing read or written through the handle yet.
    Unbound,
    /// Read through a shared reference since the last read, write or check.
    Clean,
    /// The cached value was handed out mutably and may have diverged.
    Dirty,
}

/// What a handle needs from its transaction to load and store payloads.
pub(crate) struct Access<'a> {
    pub(crate) parent: &'a dyn Context,
    pub(crate) overlay: &'a mut Overlay,
    pub(crate) shared: &'a Shared,
}

impl Access<'_> {
    /// Current payload of `pointer`, applying the unset-read policy.
    pub(crate) fn load(&mut self, pointer: PointerId) -> CoreResult<Vec<u8>> {
        let blob = self.overlay.read(self.parent, pointer)?;
        if blob.is_unset() {
            return match self.shared.config.unset_reads {
                UnsetPolicy::Reject => Err(CoreError::unset(pointer)),
                UnsetPolicy::DecodeAsNull => self
                    .shared
                    .codec
                    .encode(&Value::Null)
                    .map_err(|source| CoreError::Decode { pointer, source }),
            };
        }
        self.shared
            .blobs
            .read(blob)?
            .ok_or(CoreError::MissingBlob { blob })
    }

    /// Writes `payload` as a new blob and repoints `pointer` in the overlay.
    pub(crate) fn store(&mut self, pointer: PointerId, payload: &[u8]) -> CoreResult<BlobId> {
        let blob = self.shared.blobs.write(payload)?;
        self.shared.stats.record_blob_write(payload.len() as u64);
        self.overlay.write(pointer, blob);
        debug!(%pointer, %blob, len = payload.len(), "pointer written");
        Ok(blob)
    }
}

enum HandleState<T> {
    Unbound,
    Clean { original: Vec<u8>, value: T },
    Dirty { original: Vec<u8>, value: T },
}

/// The cached value of one pointer inside one transaction.
///
/// `original` holds the payload the value was decoded from (or last
/// written as), so a bound value can be re-encoded and compared at commit.
pub(crate) struct Handle<T> {
    pointer: PointerId,
    state: HandleState<T>,
}

impl<T: Storable> Handle<T> {
    pub(crate) fn new(pointer: PointerId) -> Self {
        Self {
            pointer,
            state: HandleState::Unbound,
        }
    }

    /// Returns the cached value, loading it first if unbound. `dirty` marks
    /// the value as possibly mutated by the caller.
    pub(crate) fn value(&mut self, access: &mut Access<'_>, dirty: bool) -> CoreResult<&mut T> {
        self.state = match std::mem::replace(&mut self.state, HandleState::Unbound) {
            HandleState::Unbound => {
                let original = access.load(self.pointer)?;
                let value = decode_with(access.shared.codec(), &original).map_err(|source| {
                    CoreError::Decode {
                        pointer: self.pointer,
                        source,
                    }
                })?;
                if dirty {
                    HandleState::Dirty { original, value }
                } else {
                    HandleState::Clean { original, value }
                }
            }
            HandleState::Clean { original, value } if dirty => HandleState::Dirty { original, value },
            bound => bound,
        };
        match &mut self.state {
            HandleState::Clean { value, .. } | HandleState::Dirty { value, .. } => Ok(value),
            HandleState::Unbound => Err(CoreError::unset(self.pointer)),
        }
    }

    /// Encodes and writes `value` immediately, caching it as clean.
    pub(crate) fn set_value(&mut self, access: &mut Access<'_>, value: T) -> CoreResult<()> {
        let pointer = self.pointer;
        let original = encode_with(access.shared.codec(), &value)
            .map_err(|source| CoreError::Encode { pointer, source })?;
        access.store(pointer, &original)?;
        self.state = HandleState::Clean { original, value };
        Ok(())
    }
}

/// Type-erased handle stored in a transaction's attachment table.
pub(crate) trait AttachedHandle: Send {
    /// Writes the cached value back if it diverged from its payload.
    /// Returns `true` if a blob was written.
    fn check(&mut self, access: &mut Access<'_>) -> CoreResult<bool>;

    fn status(&self) -> HandleStatus;

    fn type_name(&self) -> &'static str;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Storable> AttachedHandle for Handle<T> {
    fn check(&mut self, access: &mut Access<'_>) -> CoreResult<bool> {
        // Clean values are compared too: interior mutability can change them
        // behind a shared reference.
        let (HandleState::Clean { original, value } | HandleState::Dirty { original, value }) =
            &self.state
        else {
            return Ok(false);
        };
        let pointer = self.pointer;
        let encoded = encode_with(access.shared.codec(), value)
            .map_err(|source| CoreError::Encode { pointer, source })?;
        let changed = encoded != *original;
        if changed {
            access.store(pointer, &encoded)?;
            access.shared.stats.record_handle_flush();
        }
        if let HandleState::Clean { value, .. } | HandleState::Dirty { value, .. } =
            std::mem::replace(&mut self.state, HandleState::Unbound)
        {
            self.state = HandleState::Clean {
                original: encoded,
                value,
            };
        }
        Ok(changed)
    }

    fn status(&self) -> HandleStatus {
        match self.state {
            HandleState::Unbound => HandleStatus::Unbound,
            HandleState::Clean { .. } => HandleStatus::Clean,
            HandleState::Dirty { .. } => HandleStatus::Dirty,
        }
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Handles attached to a transaction, by pointer.
pub(crate) type HandleTable = BTreeMap<PointerId, Box<dyn AttachedHandle>>;

/// Returns the `T` handle for `pointer`, creating an unbound one if needed.
///
/// An unbound handle of another type holds no value, so it is replaced. This
/// happens when a typed read fails to decode and the pointer is then read
/// with the right type.
pub(crate) fn handle_entry<T: Storable>(
    table: &mut HandleTable,
    pointer: PointerId,
) -> CoreResult<&mut Handle<T>> {
    let slot = table
        .entry(pointer)
        .or_insert_with(|| Box::new(Handle::<T>::new(pointer)));
    if slot.status() == HandleStatus::Unbound && !slot.as_any_mut().is::<Handle<T>>() {
        *slot = Box::new(Handle::<T>::new(pointer));
    }
    let bound = slot.type_name();
    slot.as_any_mut()
        .downcast_mut::<Handle<T>>()
        .ok_or(CoreError::HandleTypeMismatch { pointer, bound })
}

/// Runs `check` on every attached handle. Returns how many wrote a blob.
pub(crate) fn check_all(table: &mut HandleTable, access: &mut Access<'_>) -> CoreResult<usize> {
    let mut written = 0;
    for handle in table.values_mut() {
        if handle.check(access)? {
            written += 1;
        }
    }
    Ok(written)
}
