//! Memory-mapped fixed-width array files.

use crate::element::Element;
use crate::error::{StorageError, StorageResult};
use crate::mmap;
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Array file of 32-bit signed integers.
pub type IntArrayFile = MappedArrayFile<i32>;

/// Array file of 64-bit signed integers.
pub type LongArrayFile = MappedArrayFile<i64>;

/// A random-access array of `E` persisted in a file and accessed through a
/// writable memory map.
///
/// The file is exactly `len * E::WIDTH` bytes. Growing it (via
/// [`append`](Self::append) or [`allocate`](Self::allocate)) remaps the
/// file; new slots read as zero.
///
/// ```no_run
/// use stm_storage::IntArrayFile;
/// use std::path::Path;
///
/// let mut array = IntArrayFile::open(Path::new("ints.bin")).unwrap();
/// array.allocate(4).unwrap();
/// array.set(2, 42).unwrap();
/// assert_eq!(array.get(2).unwrap(), 42);
/// ```
#[derive(Debug)]
pub struct MappedArrayFile<E: Element> {
    path: PathBuf,
    file: File,
    map: Option<MmapMut>,
    len: u64,
    _element: PhantomData<E>,
}

impl<E: Element> MappedArrayFile<E> {
    /// Opens or creates an array file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] when the file size is not a whole
    /// number of elements, or an I/O error.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let bytes = file.metadata()?.len();
        let width = E::WIDTH as u64;
        if bytes % width != 0 {
            return Err(StorageError::corrupted(format!(
                "{} is {bytes} bytes, not a multiple of {width}",
                path.display()
            )));
        }
        let map = mmap::map_mut(&file, bytes)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            map,
            len: bytes / width,
            _element: PhantomData,
        })
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` when the array holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfBounds`] if `index >= len`.
    pub fn get(&self, index: u64) -> StorageResult<E> {
        let range = self.byte_range(index)?;
        match &self.map {
            Some(map) => Ok(E::read_be(&map[range])),
            None => Err(self.out_of_bounds(index)),
        }
    }

    /// Overwrites the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfBounds`] if `index >= len`.
    pub fn set(&mut self, index: u64, value: E) -> StorageResult<()> {
        let range = self.byte_range(index)?;
        let err = self.out_of_bounds(index);
        let map = self.map.as_mut().ok_or(err)?;
        value.write_be(&mut map[range]);
        Ok(())
    }

    /// Appends `value` and returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be grown.
    pub fn append(&mut self, value: E) -> StorageResult<u64> {
        let index = self.len;
        self.resize(index + 1)?;
        self.set(index, value)?;
        Ok(index)
    }

    /// Grows the array to `new_len` elements.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidAllocation`] unless `new_len > len`.
    pub fn allocate(&mut self, new_len: u64) -> StorageResult<()> {
        if new_len <= self.len {
            return Err(StorageError::InvalidAllocation {
                current: self.len,
                requested: new_len,
            });
        }
        self.resize(new_len)
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: E) {
        if let Some(map) = self.map.as_mut() {
            for slot in map.chunks_exact_mut(E::WIDTH) {
                value.write_be(slot);
            }
        }
    }

    /// Copies all elements out. Intended for inspection tools.
    ///
    /// # Errors
    ///
    /// Propagates element read failures.
    pub fn to_vec(&self) -> StorageResult<Vec<E>> {
        (0..self.len).map(|index| self.get(index)).collect()
    }

    /// Flushes the mapped pages to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> StorageResult<()> {
        if let Some(map) = &self.map {
            map.flush()?;
        }
        Ok(())
    }

    fn resize(&mut self, new_len: u64) -> StorageResult<()> {
        if let Some(map) = self.map.take() {
            map.flush()?;
        }
        let bytes = new_len * E::WIDTH as u64;
        self.file.set_len(bytes)?;
        self.map = mmap::map_mut(&self.file, bytes)?;
        self.len = new_len;
        Ok(())
    }

    fn byte_range(&self, index: u64) -> StorageResult<std::ops::Range<usize>> {
        if index >= self.len {
            return Err(self.out_of_bounds(index));
        }
        let start = index as usize * E::WIDTH;
        Ok(start..start + E::WIDTH)
    }

    fn out_of_bounds(&self, index: u64) -> StorageError {
        StorageError::OutOfBounds {
            index,
            len: self.len,
        }
    }
}
