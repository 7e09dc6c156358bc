//! Blob stores: append-only maps from dense ids to immutable payloads.

mod log;
mod memory;

pub use log::LogBlobStore;
pub use memory::MemoryBlobStore;

use crate::error::CoreResult;
use crate::types::BlobId;

/// Append-only storage of immutable payloads.
///
/// # Invariants
///
/// - `write` returns `BlobId(n)` where `n` was `len()` just before the call
/// - a written payload never changes and is never removed
/// - `read` of an id that was never written returns `None`
pub trait BlobStore: Send + Sync {
    /// Stores `payload` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn write(&self, payload: &[u8]) -> CoreResult<BlobId>;

    /// Returns the payload of `id`, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn read(&self, id: BlobId) -> CoreResult<Option<Vec<u8>>>;

    /// Number of blobs written.
    fn len(&self) -> u64;

    /// Returns `true` if nothing has been written.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
