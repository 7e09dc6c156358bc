//! Buffered append-only fixed-width files.

use crate::element::Element;
use crate::error::{StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Append file of 32-bit signed integers.
pub type IntAppendFile = AppendFile<i32>;

/// An append-only log of `E` values with random-access reads.
///
/// Appends go through a buffered writer that is flushed after every value,
/// so a read right after an append sees it. After [`close`](Self::close)
/// the file stays readable but rejects further appends.
#[derive(Debug)]
pub struct AppendFile<E: Element> {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    reader: File,
    len: u64,
    _element: PhantomData<E>,
}

impl<E: Element> AppendFile<E> {
    /// Opens or creates an append file, keeping existing values.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] if the file is not a whole number
    /// of elements, or an I/O error.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let writer = OpenOptions::new().append(true).create(true).open(path)?;
        let reader = File::open(path)?;
        let bytes = reader.metadata()?.len();
        if bytes % E::WIDTH as u64 != 0 {
            return Err(StorageError::corrupted(format!(
                "{} has a partial trailing element",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(writer)),
            reader,
            len: bytes / E::WIDTH as u64,
            _element: PhantomData,
        })
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of values written.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Appends `value` and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after `close`, or an I/O error.
    pub fn append(&mut self, value: E) -> StorageResult<u64> {
        let writer = self.writer.as_mut().ok_or(StorageError::Closed)?;
        let mut buf = vec![0u8; E::WIDTH];
        value.write_be(&mut buf);
        writer.write_all(&buf)?;
        writer.flush()?;
        let index = self.len;
        self.len += 1;
        Ok(index)
    }

    /// Reads the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfBounds`] if `index >= len`.
    pub fn read(&mut self, index: u64) -> StorageResult<E> {
        if index >= self.len {
            return Err(StorageError::OutOfBounds {
                index,
                len: self.len,
            });
        }
        let mut buf = vec![0u8; E::WIDTH];
        self.reader.seek(SeekFrom::Start(index * E::WIDTH as u64))?;
        self.reader.read_exact(&mut buf)?;
        Ok(E::read_be(&buf))
    }

    /// Flushes and releases the writer. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn close(&mut self) -> StorageResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_returns_sequential_indices() {
        let dir = tempdir().unwrap();
        let mut file = IntAppendFile::open(&dir.path().join("ints.log")).unwrap();
        assert_eq!(file.append(5).unwrap(), 0);
        assert_eq!(file.append(-6).unwrap(), 1);
        assert_eq!(file.append(7).unwrap(), 2);
        assert_eq!(file.read(1).unwrap(), -6);
        assert_eq!(file.len(), 3);
    }

    #[test]
    fn read_out_of_range_fails() {
        let dir = tempdir().unwrap();
        let mut file = IntAppendFile::open(&dir.path().join("ints.log")).unwrap();
        file.append(1).unwrap();
        assert!(matches!(
            file.read(1),
            Err(StorageError::OutOfBounds { index: 1, len: 1 })
        ));
    }

    #[test]
    fn append_after_close_fails_but_reads_work() {
        let dir = tempdir().unwrap();
        let mut file = IntAppendFile::open(&dir.path().join("ints.log")).unwrap();
        file.append(99).unwrap();
        file.close().unwrap();
        file.close().unwrap();

        assert!(file.is_closed());
        assert!(matches!(file.append(1), Err(StorageError::Closed)));
        assert_eq!(file.read(0).unwrap(), 99);
    }

    #[test]
    fn reopen_continues_indices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("longs.log");
        {
            let mut file = AppendFile::<i64>::open(&path).unwrap();
            file.append(1).unwrap();
            file.append(2).unwrap();
            file.close().unwrap();
        }
        let mut file = AppendFile::<i64>::open(&path).unwrap();
        assert_eq!(file.append(3).unwrap(), 2);
        assert_eq!(file.read(0).unwrap(), 1);
        assert_eq!(file.read(2).unwrap(), 3);
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Wide(u128);

    impl Element for Wide {
        const WIDTH: usize = 16;

        fn read_be(bytes: &[u8]) -> Self {
            let mut buf = [0u8; 16];
            buf.copy_from_slice(&bytes[..16]);
            Wide(u128::from_be_bytes(buf))
        }

        fn write_be(self, out: &mut [u8]) {
            out[..16].copy_from_slice(&self.0.to_be_bytes());
        }
    }

    #[test]
    fn elements_wider_than_a_word() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.log");
        let mut file = AppendFile::<Wide>::open(&path).unwrap();
        file.append(Wide(1)).unwrap();
        file.append(Wide(u128::MAX - 1)).unwrap();
        assert_eq!(file.read(1).unwrap(), Wide(u128::MAX - 1));
        assert_eq!(file.read(0).unwrap(), Wide(1));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 32);
    }
}
