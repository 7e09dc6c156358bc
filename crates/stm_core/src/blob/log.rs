//! Blob store over a length-prefixed append log.

use super::BlobStore;
use crate::error::CoreResult;
use crate::types::BlobId;
use parking_lot::RwLock;
use stm_storage::{StorageBackend, StorageError, RECORD_HEADER_SIZE};
use tracing::{debug, trace, warn};

#[derive(Debug)]
struct LogState<B> {
    backend: B,
    /// Payload offset and length per blob id.
    index: Vec<(u64, usize)>,
}

/// A blob store that appends each payload to a [`StorageBackend`].
///
/// Records are framed as a 4-byte big-endian length followed by the
/// payload, the same framing as [`stm_storage::SequenceFile`]. Opening a
/// backend replays the frames to rebuild the id index; a trailing frame
/// cut short by a crash is truncated away.
///
/// Only blobs persist. Pointer tables live in memory, so a reopened log is
/// useful for inspection and for seeding a fresh engine, not for resuming
/// one.
#[derive(Debug)]
pub struct LogBlobStore<B: StorageBackend> {
    state: RwLock<LogState<B>>,
}

impl<B: StorageBackend> LogBlobStore<B> {
    /// Opens a log over `backend`, indexing any blobs already in it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or truncated.
    pub fn open(mut backend: B) -> CoreResult<Self> {
        let size = backend.size()?;
        let header = RECORD_HEADER_SIZE as u64;
        let mut index = Vec::new();
        let mut pos = 0u64;
        while pos + header <= size {
            let len = frame_len(&backend.read_at(pos, RECORD_HEADER_SIZE)?);
            let start = pos + header;
            if start + len as u64 > size {
                break;
            }
            index.push((start, len));
            pos = start + len as u64;
        }
        if pos < size {
            warn!(kept = pos, size, "truncating torn blob log tail");
            backend.truncate(pos)?;
        }
        debug!(blobs = index.len(), bytes = pos, "opened blob log");
        Ok(Self {
            state: RwLock::new(LogState { backend, index }),
        })
    }

    /// Forces written blobs to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend sync fails.
    pub fn sync(&self) -> CoreResult<()> {
        self.state.write().backend.sync()?;
        Ok(())
    }

    /// Consumes the store and returns its backend.
    pub fn into_backend(self) -> B {
        self.state.into_inner().backend
    }
}

impl<B: StorageBackend> BlobStore for LogBlobStore<B> {
    fn write(&self, payload: &[u8]) -> CoreResult<BlobId> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            StorageError::corrupted(format!(
                "blob of {} bytes exceeds the frame limit",
                payload.len()
            ))
        })?;
        let mut frame = Vec::with_capacity(RECORD_HEADER_SIZE + payload.len());
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(payload);

        let mut state = self.state.write();
        let offset = state.backend.append(&frame)?;
        // Indexed before the flush: ids must track records in the backend.
        let id = BlobId(state.index.len() as u64);
        state
            .index
            .push((offset + RECORD_HEADER_SIZE as u64, payload.len()));
        state.backend.flush()?;
        trace!(blob = %id, offset, len = payload.len(), "blob appended");
        Ok(id)
    }

    fn read(&self, id: BlobId) -> CoreResult<Option<Vec<u8>>> {
        let state = self.state.read();
        let Some(&(offset, len)) = usize::try_from(id.0)
            .ok()
            .and_then(|index| state.index.get(index))
        else {
            return Ok(None);
        };
        Ok(Some(state.backend.read_at(offset, len)?))
    }

    fn len(&self) -> u64 {
        self.state.read().index.len() as u64
    }
}

fn frame_len(header: &[u8]) -> usize {
    let mut buf = [0u8; RECORD_HEADER_SIZE];
    buf.copy_from_slice(&header[..RECORD_HEADER_SIZE]);
    u32::from_be_bytes(buf) as usize
}
