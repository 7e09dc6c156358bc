//! Vector-backed blob store.

use super::BlobStore;
use crate::error::CoreResult;
use crate::types::BlobId;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

/// A blob store that keeps payloads in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<Vec<Arc<[u8]>>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn write(&self, payload: &[u8]) -> CoreResult<BlobId> {
        let mut blobs = self.blobs.write();
        let id = BlobId(blobs.len() as u64);
        blobs.push(Arc::from(payload));
        trace!(blob = %id, len = payload.len(), "blob written");
        Ok(id)
    }

    fn read(&self, id: BlobId) -> CoreResult<Option<Vec<u8>>> {
        let blobs = self.blobs.read();
        Ok(usize::try_from(id.0)
            .ok()
            .and_then(|index| blobs.get(index))
            .map(|payload| payload.to_vec()))
    }

    fn len(&self) -> u64 {
        self.blobs.read().len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ids_are_dense() {
        let store = MemoryBlobStore::new();
        assert!(store.is_empty());
        assert_eq!(store.write(b"a").unwrap(), BlobId(0));
        assert_eq!(store.write(b"").unwrap(), BlobId(1));
        assert_eq!(store.write(b"c").unwrap(), BlobId(2));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn unknown_ids_read_as_none() {
        let store = MemoryBlobStore::new();
        store.write(b"only").unwrap();
        assert_eq!(store.read(BlobId(1)).unwrap(), None);
        assert_eq!(store.read(BlobId::UNSET).unwrap(), None);
    }

    #[test]
    fn identical_payloads_get_distinct_ids() {
        let store = MemoryBlobStore::new();
        let a = store.write(b"same").unwrap();
        let b = store.write(b"same").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.read(a).unwrap(), store.read(b).unwrap());
    }

    proptest! {
        #[test]
        fn written_payloads_read_back(payloads in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..64), 1..16,
        )) {
            let store = MemoryBlobStore::new();
            let ids: Vec<_> = payloads.iter().map(|p| store.write(p).unwrap()).collect();
            for (id, payload) in ids.into_iter().zip(&payloads) {
                let read = store.read(id).unwrap();
                prop_assert_eq!(read.as_ref(), Some(payload));
            }
        }
    }
}
