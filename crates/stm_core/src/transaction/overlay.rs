//! A transaction's private view of pointer reads and writes.

use super::context::Context;
use crate::error::CoreResult;
use crate::types::{BlobId, PointerId};
use std::collections::BTreeMap;
use tracing::trace;

#[derive(Debug, Default)]
pub(crate) struct Overlay {
    /// Pending targets, applied to the parent on commit.
    pub(crate) writes: BTreeMap<PointerId, BlobId>,
    /// Target observed in the parent on first read, validated on commit.
    pub(crate) reads: BTreeMap<PointerId, BlobId>,
}

impl Overlay {
    /// Reads through to the parent unless this overlay wrote the pointer.
    pub(crate) fn read(&mut self, parent: &dyn Context, pointer: PointerId) -> CoreResult<BlobId> {
        if let Some(&blob) = self.writes.get(&pointer) {
            return Ok(blob);
        }
        let observed = parent.read_pointer(pointer)?;
        // First read wins: later reads are still validated against it.
        self.reads.entry(pointer).or_insert(observed);
        trace!(%pointer, blob = %observed, "read from parent");
        Ok(observed)
    }

    pub(crate) fn write(&mut self, pointer: PointerId, blob: BlobId) {
        self.writes.insert(pointer, blob);
    }

    /// Allocates in the parent and marks the pointer as existing but unset here.
    pub(crate) fn allocate(&mut self, parent: &dyn Context) -> CoreResult<PointerId> {
        let pointer = parent.allocate_pointer()?;
        self.writes.insert(pointer, BlobId::UNSET);
        Ok(pointer)
    }

    pub(crate) fn contains(&self, parent: &dyn Context, pointer: PointerId) -> bool {
        self.writes.contains_key(&pointer) || parent.contains_pointer(pointer)
    }
}
