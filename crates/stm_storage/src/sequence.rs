//! Length-prefixed record log with memory-mapped reads.

use crate::error::{StorageError, StorageResult};
use crate::mmap;
use memmap2::Mmap;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Size of the big-endian length prefix in front of every record.
pub const RECORD_HEADER_SIZE: usize = 4;

/// An append-only file of variable-length records.
///
/// Each record is framed as a 4-byte big-endian length followed by its
/// bytes. Reads go through a read-only memory map that is re-established
/// lazily once appends have moved past the mapped region.
#[derive(Debug)]
pub struct SequenceFile {
    path: PathBuf,
    file: File,
    map: Option<Mmap>,
    mapped_len: u64,
    offsets: Vec<u64>,
    end: u64,
}

impl SequenceFile {
    /// Opens or creates a sequence file and indexes its records.
    ///
    /// A trailing record whose body was cut short is dropped and the file
    /// truncated to the last complete record.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, mapped or truncated.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let size = file.metadata()?.len();
        let map = mmap::map_read(&file, size)?;

        let mut offsets = Vec::new();
        let mut pos = 0u64;
        if let Some(bytes) = map.as_deref() {
            while let Some(body) = record_len(bytes, pos) {
                let next = pos + RECORD_HEADER_SIZE as u64 + body;
                if next > size {
                    break;
                }
                offsets.push(pos);
                pos = next;
            }
        }

        let mut seq = Self {
            path: path.to_path_buf(),
            file,
            map,
            mapped_len: size,
            offsets,
            end: pos,
        };
        if pos < size {
            warn!(path = %path.display(), kept = pos, size, "dropping torn trailing record");
            seq.map = None;
            seq.file.set_len(pos)?;
            seq.mapped_len = 0;
        }
        debug!(path = %path.display(), records = seq.offsets.len(), "opened sequence file");
        Ok(seq)
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.offsets.len() as u64
    }

    /// Returns `true` if the file holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// All valid record indices.
    #[must_use]
    pub fn indices(&self) -> Range<u64> {
        0..self.len()
    }

    /// Appends a record and returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exceeds `u32::MAX` bytes or the write fails.
    pub fn append(&mut self, record: &[u8]) -> StorageResult<u64> {
        let body = u32::try_from(record.len()).map_err(|_| {
            StorageError::corrupted(format!("record of {} bytes exceeds frame limit", record.len()))
        })?;
        self.file.seek(SeekFrom::Start(self.end))?;
        self.file.write_all(&body.to_be_bytes())?;
        self.file.write_all(record)?;
        self.file.flush()?;

        let index = self.len();
        self.offsets.push(self.end);
        self.end += RECORD_HEADER_SIZE as u64 + u64::from(body);
        Ok(index)
    }

    /// Reads the record at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfBounds`] if `index >= len`.
    pub fn get(&mut self, index: u64) -> StorageResult<Vec<u8>> {
        let offset = *self
            .offsets
            .get(index as usize)
            .ok_or(StorageError::OutOfBounds {
                index,
                len: self.len(),
            })?;
        let bytes = self.mapped()?;
        let body = record_len(bytes, offset)
            .ok_or_else(|| StorageError::corrupted(format!("record {index} header missing")))?;
        let start = offset as usize + RECORD_HEADER_SIZE;
        Ok(bytes[start..start + body as usize].to_vec())
    }

    /// Reads several records, yielding `None` for indices that do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if mapping the file fails.
    pub fn get_many(&mut self, indices: &[u64]) -> StorageResult<Vec<Option<Vec<u8>>>> {
        indices
            .iter()
            .map(|&index| match self.get(index) {
                Ok(record) => Ok(Some(record)),
                Err(StorageError::OutOfBounds { .. }) => Ok(None),
                Err(err) => Err(err),
            })
            .collect()
    }

    /// Reads every record in order.
    ///
    /// # Errors
    ///
    /// Returns an error if mapping the file fails.
    pub fn read_all(&mut self) -> StorageResult<Vec<Vec<u8>>> {
        self.indices().map(|index| self.get(index)).collect()
    }

    fn mapped(&mut self) -> StorageResult<&[u8]> {
        if self.mapped_len < self.end {
            self.map = None;
            self.map = mmap::map_read(&self.file, self.end)?;
            self.mapped_len = self.end;
        }
        Ok(self.map.as_deref().unwrap_or(&[]))
    }
}

fn record_len(bytes: &[u8], offset: u64) -> Option<u64> {
    let start = usize::try_from(offset).ok()?;
    let header = bytes.get(start..start.checked_add(RECORD_HEADER_SIZE)?)?;
    let mut buf = [0u8; RECORD_HEADER_SIZE];
    buf.copy_from_slice(header);
    Some(u64::from(u32::from_be_bytes(buf)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_and_get_records() {
        let dir = tempdir().unwrap();
        let mut seq = SequenceFile::open(&dir.path().join("records.seq")).unwrap();
        assert_eq!(seq.append(b"alpha").unwrap(), 0);
        assert_eq!(seq.append(b"").unwrap(), 1);
        assert_eq!(seq.append(b"gamma ray").unwrap(), 2);

        assert_eq!(seq.get(0).unwrap(), b"alpha");
        assert!(seq.get(1).unwrap().is_empty());
        assert_eq!(seq.get(2).unwrap(), b"gamma ray");
        assert_eq!(seq.indices(), 0..3);
    }

    #[test]
    fn get_out_of_range_fails() {
        let dir = tempdir().unwrap();
        let mut seq = SequenceFile::open(&dir.path().join("records.seq")).unwrap();
        assert!(seq.get(0).unwrap_err().is_out_of_bounds());
        seq.append(b"x").unwrap();
        assert!(matches!(
            seq.get(3),
            Err(StorageError::OutOfBounds { index: 3, len: 1 })
        ));
    }

    #[test]
    fn get_many_marks_missing_indices() {
        let dir = tempdir().unwrap();
        let mut seq = SequenceFile::open(&dir.path().join("records.seq")).unwrap();
        seq.append(b"one").unwrap();
        seq.append(b"two").unwrap();
        let records = seq.get_many(&[1, 5, 0]).unwrap();
        assert_eq!(
            records,
            vec![Some(b"two".to_vec()), None, Some(b"one".to_vec())]
        );
    }

    #[test]
    fn reads_interleave_with_appends() {
        let dir = tempdir().unwrap();
        let mut seq = SequenceFile::open(&dir.path().join("records.seq")).unwrap();
        for i in 0..20u32 {
            seq.append(&i.to_be_bytes()).unwrap();
            assert_eq!(seq.get(u64::from(i)).unwrap(), i.to_be_bytes());
        }
        assert_eq!(seq.read_all().unwrap().len(), 20);
    }

    #[test]
    fn reopen_rebuilds_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.seq");
        {
            let mut seq = SequenceFile::open(&path).unwrap();
            seq.append(b"persisted").unwrap();
            seq.append(b"too").unwrap();
        }
        let mut seq = SequenceFile::open(&path).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.read_all().unwrap(), vec![b"persisted".to_vec(), b"too".to_vec()]);
        assert_eq!(seq.append(b"more").unwrap(), 2);
    }

    #[test]
    fn torn_tail_is_truncated_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.seq");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(b"abc");
        bytes.extend_from_slice(&10u32.to_be_bytes());
        bytes.extend_from_slice(b"shor");
        std::fs::write(&path, &bytes).unwrap();

        let mut seq = SequenceFile::open(&path).unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 7);
        assert_eq!(seq.append(b"next").unwrap(), 1);
        assert_eq!(seq.get(1).unwrap(), b"next");
    }
}
