//! Core type definitions.

use std::fmt;

/// Identifier of a pointer: a stable name whose target blob changes over time.
///
/// Pointer ids are allocated densely by the root table and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointerId(pub u64);

impl PointerId {
    /// The pointer allocated when an engine is created.
    pub const ROOT: PointerId = PointerId(0);

    /// Creates a pointer id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ptr:{}", self.0)
    }
}

/// Identifier of an immutable blob.
///
/// Blob ids are dense: the next id equals the number of blobs written.
/// [`BlobId::UNSET`] marks a pointer that has been allocated but never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobId(pub u64);

impl BlobId {
    /// Sentinel target of a freshly allocated pointer.
    pub const UNSET: BlobId = BlobId(u64::MAX);

    /// Creates a blob id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns `true` for the unset sentinel.
    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == u64::MAX
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            f.write_str("blob:unset")
        } else {
            write!(f, "blob:{}", self.0)
        }
    }
}

/// Unique identifier for a transaction.
///
/// Transaction ids are monotonically increasing per engine and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a transaction id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Mutation counter of a pointer table.
///
/// Advances once per mutating call. Diagnostic only: conflict detection
/// compares per-pointer blob ids, never revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Revision(pub u64);

impl Revision {
    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the following revision.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rev:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(PointerId::new(3).to_string(), "ptr:3");
        assert_eq!(BlobId::new(9).to_string(), "blob:9");
        assert_eq!(BlobId::UNSET.to_string(), "blob:unset");
        assert_eq!(TransactionId::new(2).to_string(), "txn:2");
        assert_eq!(Revision(4).next().to_string(), "rev:5");
    }

    #[test]
    fn unset_sentinel() {
        assert!(BlobId::UNSET.is_unset());
        assert!(!BlobId::new(0).is_unset());
        assert_eq!(PointerId::ROOT.as_u64(), 0);
    }
}
