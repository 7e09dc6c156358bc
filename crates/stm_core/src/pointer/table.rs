//! The root pointer table.

use crate::error::{CoreError, CoreResult};
use crate::types::{BlobId, PointerId, Revision};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
struct TableState {
    targets: Vec<BlobId>,
    revision: Revision,
}

impl TableState {
    fn get(&self, pointer: PointerId) -> CoreResult<BlobId> {
        usize::try_from(pointer.0)
            .ok()
            .and_then(|index| self.targets.get(index))
            .copied()
            .ok_or(CoreError::MissingPointer { pointer })
    }

    /// Checks every pointer exists, then applies all entries and advances the
    /// revision once.
    fn set_all<'a>(
        &mut self,
        entries: impl Iterator<Item = (&'a PointerId, &'a BlobId)> + Clone,
    ) -> CoreResult<()> {
        for (&pointer, _) in entries.clone() {
            self.get(pointer)?;
        }
        for (&pointer, &blob) in entries {
            self.targets[pointer.0 as usize] = blob;
        }
        self.revision = self.revision.next();
        Ok(())
    }
}

/// The shared mapping from pointer ids to blob ids.
///
/// Pointer ids are dense: [`new_pointer`](Self::new_pointer) hands out the
/// current length. Every mutating call advances the [`Revision`] exactly
/// once, however many entries it touches.
///
/// ```rust
/// use stm_core::{BlobId, PointerTable};
///
/// let table = PointerTable::new();
/// let p = table.new_pointer();
/// assert_eq!(table.get(p).unwrap(), BlobId::UNSET);
/// table.set(p, BlobId(4)).unwrap();
/// assert_eq!(table.get(p).unwrap(), BlobId(4));
/// ```
#[derive(Debug, Default)]
pub struct PointerTable {
    state: RwLock<TableState>,
}

impl PointerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the blob `pointer` currently targets.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPointer`] if `pointer` was never allocated.
    pub fn get(&self, pointer: PointerId) -> CoreResult<BlobId> {
        self.state.read().get(pointer)
    }

    /// Returns `true` if `pointer` has been allocated.
    #[must_use]
    pub fn contains(&self, pointer: PointerId) -> bool {
        self.get(pointer).is_ok()
    }

    /// Repoints one pointer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPointer`] if `pointer` was never allocated.
    pub fn set(&self, pointer: PointerId, blob: BlobId) -> CoreResult<()> {
        self.set_batch(&[(pointer, blob)])
    }

    /// Repoints several pointers as one revision step.
    ///
    /// Nothing changes unless every pointer exists.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPointer`] for the first unknown pointer.
    pub fn set_batch(&self, entries: &[(PointerId, BlobId)]) -> CoreResult<()> {
        let mut state = self.state.write();
        state.set_all(entries.iter().map(|(p, b)| (p, b)))?;
        debug!(entries = entries.len(), revision = %state.revision, "pointers set");
        Ok(())
    }

    /// Allocates the next pointer id, targeting [`BlobId::UNSET`].
    pub fn new_pointer(&self) -> PointerId {
        let mut state = self.state.write();
        let pointer = PointerId(state.targets.len() as u64);
        state.targets.push(BlobId::UNSET);
        state.revision = state.revision.next();
        debug!(%pointer, revision = %state.revision, "pointer allocated");
        pointer
    }

    /// Current revision.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.state.read().revision
    }

    /// Number of allocated pointers.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.state.read().targets.len() as u64
    }

    /// Returns `true` if no pointer has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().targets.is_empty()
    }

    /// Copies every target, indexed by pointer id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BlobId> {
        self.state.read().targets.clone()
    }

    /// Validates `reads` and applies `writes` under one exclusive lock.
    ///
    /// Each read must still hold the blob it observed; otherwise the first
    /// pointer that moved is reported and nothing is applied.
    pub(crate) fn validate_and_apply(
        &self,
        reads: &BTreeMap<PointerId, BlobId>,
        writes: &BTreeMap<PointerId, BlobId>,
    ) -> CoreResult<()> {
        let mut state = self.state.write();
        for (&pointer, &observed) in reads {
            let current = state.get(pointer)?;
            if current != observed {
                return Err(CoreError::Conflict {
                    pointer,
                    observed,
                    current,
                });
            }
        }
        if !writes.is_empty() {
            state.set_all(writes.iter())?;
        }
        debug!(
            reads = reads.len(),
            writes = writes.len(),
            revision = %state.revision,
            "validated and applied"
        );
        Ok(())
    }
}
