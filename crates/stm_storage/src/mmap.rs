//! The only place this crate creates memory maps.

use crate::error::StorageResult;
use memmap2::{Mmap, MmapMut, MmapOptions};
use std::fs::File;

/// Maps the first `len` bytes of `file` writable. Returns `None` for an empty range.
#[allow(unsafe_code)]
pub(crate) fn map_mut(file: &File, len: u64) -> StorageResult<Option<MmapMut>> {
    if len == 0 {
        return Ok(None);
    }
    // SAFETY: the file is owned by the caller for the lifetime of the map and is
    // only resized after the map has been dropped. Concurrent modification by
    // other processes is outside this crate's contract.
    let map = unsafe { MmapOptions::new().len(len as usize).map_mut(file)? };
    Ok(Some(map))
}

/// Maps the first `len` bytes of `file` read-only. Returns `None` for an empty range.
#[allow(unsafe_code)]
pub(crate) fn map_read(file: &File, len: u64) -> StorageResult<Option<Mmap>> {
    if len == 0 {
        return Ok(None);
    }
    // SAFETY: as for `map_mut`; the owner appends only past `len` while the map lives.
    let map = unsafe { MmapOptions::new().len(len as usize).map(file)? };
    Ok(Some(map))
}
