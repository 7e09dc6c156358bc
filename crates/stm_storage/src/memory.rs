//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// A backend that keeps every byte in a growable buffer.
///
/// Used by the engine's default blob log and by tests that want to inspect
/// or corrupt the raw bytes.
///
/// ```rust
/// use stm_storage::{InMemoryBackend, StorageBackend};
///
/// let mut backend = InMemoryBackend::new();
/// assert_eq!(backend.append(b"abc").unwrap(), 0);
/// assert_eq!(backend.append(b"de").unwrap(), 3);
/// assert_eq!(backend.size().unwrap(), 5);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    bytes: RwLock<Vec<u8>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend preloaded with `bytes`, e.g. a log image to recover.
    #[must_use]
    pub fn with_data(bytes: Vec<u8>) -> Self {
        Self {
            bytes: RwLock::new(bytes),
        }
    }

    /// Returns a copy of the stored bytes.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let bytes = self.bytes.read();
        let size = bytes.len() as u64;
        let end = offset.saturating_add(len as u64);
        if end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }
        Ok(bytes[offset as usize..end as usize].to_vec())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let bytes = self.bytes.get_mut();
        let offset = bytes.len() as u64;
        bytes.extend_from_slice(data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.bytes.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let bytes = self.bytes.get_mut();
        let size = bytes.len() as u64;
        if new_size > size {
            return Err(StorageError::InvalidTruncate {
                requested: new_size,
                size,
            });
        }
        bytes.truncate(new_size as usize);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_append_returns_previous_size() {
        let mut backend = InMemoryBackend::new();
        assert_eq!(backend.append(b"\x00\x00\x00\x02hi").unwrap(), 0);
        assert_eq!(backend.append(b"\x00\x00\x00\x01!").unwrap(), 6);
        assert_eq!(backend.size().unwrap(), 11);
    }

    #[test]
    fn memory_read_at_returns_appended_slice() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"header").unwrap();
        let offset = backend.append(b"payload").unwrap();
        assert_eq!(backend.read_at(offset, 7).unwrap(), b"payload");
        assert_eq!(backend.read_at(2, 4).unwrap(), b"ader");
    }

    #[test]
    fn memory_read_outside_fails() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"short").unwrap();
        assert!(matches!(
            backend.read_at(3, 10),
            Err(StorageError::ReadPastEnd { size: 5, .. })
        ));
        assert!(matches!(
            backend.read_at(9, 0),
            Err(StorageError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn memory_zero_length_read_at_end() {
        let backend = InMemoryBackend::with_data(b"abc".to_vec());
        assert!(backend.read_at(3, 0).unwrap().is_empty());
    }

    #[test]
    fn memory_truncate_drops_tail() {
        let mut backend = InMemoryBackend::with_data(b"complete+torn".to_vec());
        backend.truncate(8).unwrap();
        assert_eq!(backend.data(), b"complete");
        assert!(matches!(
            backend.truncate(20),
            Err(StorageError::InvalidTruncate { requested: 20, size: 8 })
        ));
    }

    #[test]
    fn memory_flush_and_sync_are_noops() {
        let mut backend = InMemoryBackend::with_data(vec![1, 2, 3]);
        backend.flush().unwrap();
        backend.sync().unwrap();
        assert_eq!(backend.data(), vec![1, 2, 3]);
    }
}
