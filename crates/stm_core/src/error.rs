//! Error types for the STM engine.

use crate::types::{BlobId, PointerId};
use stm_codec::CodecError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] stm_storage::StorageError),

    /// A pointer id that was never allocated.
    #[error("pointer {pointer} does not exist")]
    MissingPointer {
        /// The requested pointer.
        pointer: PointerId,
    },

    /// A pointer refers to a blob the store does not hold.
    #[error("{blob} is not in the blob store")]
    MissingBlob {
        /// The dangling blob id.
        blob: BlobId,
    },

    /// Optimistic validation failed at commit.
    #[error("conflict on {pointer}: read {observed}, parent now holds {current}")]
    Conflict {
        /// The pointer whose target moved.
        pointer: PointerId,
        /// The blob id this transaction observed.
        observed: BlobId,
        /// The blob id the parent holds at commit.
        current: BlobId,
    },

    /// A value could not be encoded for storage.
    #[error("cannot encode value for {pointer}: {source}")]
    Encode {
        /// The pointer being written.
        pointer: PointerId,
        /// The codec failure.
        source: CodecError,
    },

    /// A stored payload could not be decoded as the requested type.
    #[error("cannot decode {pointer}: {source}")]
    Decode {
        /// The pointer being read.
        pointer: PointerId,
        /// The codec failure.
        source: CodecError,
    },

    /// A pointer already has a cached handle of a different type in this transaction.
    #[error("{pointer} is already bound as {bound}")]
    HandleTypeMismatch {
        /// The pointer.
        pointer: PointerId,
        /// Type name of the existing handle.
        bound: &'static str,
    },

    /// The caller abandoned the transaction.
    #[error("transaction aborted: {reason}")]
    TransactionAborted {
        /// Reason for abort.
        reason: String,
    },
}

impl CoreError {
    /// Creates an abort error, typically returned from a transaction body.
    pub fn transaction_aborted(reason: impl Into<String>) -> Self {
        Self::TransactionAborted {
            reason: reason.into(),
        }
    }

    /// Decode error for reading a pointer that was allocated but never set.
    pub(crate) fn unset(pointer: PointerId) -> Self {
        Self::Decode {
            pointer,
            source: CodecError::decoding_failed("pointer has no value"),
        }
    }

    /// Returns `true` for commit-time conflicts, the only retryable error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns the conflicting pointer, if this is a conflict.
    #[must_use]
    pub fn conflict_pointer(&self) -> Option<PointerId> {
        match self {
            Self::Conflict { pointer, .. } => Some(*pointer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_names_pointer() {
        let err = CoreError::Conflict {
            pointer: PointerId(4),
            observed: BlobId(1),
            current: BlobId(2),
        };
        assert!(err.is_conflict());
        assert_eq!(err.conflict_pointer(), Some(PointerId(4)));
        assert_eq!(
            err.to_string(),
            "conflict on ptr:4: read blob:1, parent now holds blob:2"
        );
    }

    #[test]
    fn other_errors_are_not_conflicts() {
        let err = CoreError::transaction_aborted("caller bailed");
        assert!(!err.is_conflict());
        assert_eq!(err.conflict_pointer(), None);
        assert_eq!(err.to_string(), "transaction aborted: caller bailed");
    }

    #[test]
    fn unset_is_a_decode_error() {
        assert!(matches!(
            CoreError::unset(PointerId(1)),
            CoreError::Decode { pointer: PointerId(1), .. }
        ));
    }
}
