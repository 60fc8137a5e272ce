//! Error types for queue and buffer operations.

use thiserror::Error;

use crate::compare::CompareError;

/// Result alias for container operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by [`PriorityQueue`](crate::PriorityQueue),
/// [`IndexedPriorityQueue`](crate::IndexedPriorityQueue) and
/// [`TopKBuffer`](crate::TopKBuffer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An element comparison failed. The container is unchanged unless it
    /// also reports [`is_poisoned`](crate::PriorityQueue::is_poisoned).
    #[error(transparent)]
    Compare(#[from] CompareError),

    /// Dequeue from an empty queue.
    #[error("queue is empty")]
    Empty,

    /// The handle is not resident in this queue.
    #[error("item is not in the queue")]
    NotInQueue,

    /// The handle is already resident in a queue.
    #[error("item is already in a queue")]
    AlreadyQueued,

    /// The requested capacity cannot be allocated.
    #[error("capacity {requested} cannot be allocated")]
    InvalidCapacity {
        /// Requested capacity.
        requested: usize,
    },

    /// A top-k buffer was given `k == 0`.
    #[error("k must be positive")]
    ZeroK,

    /// An insert failed and undoing it failed too.
    ///
    /// The container is poisoned.
    #[error("{original}; rollback failed: {rollback}")]
    Corrupted {
        /// The failure that triggered the rollback.
        original: CompareError,
        /// Why the rollback failed.
        rollback: RollbackFailure,
    },

    /// An earlier failure left heap order unrepaired.
    ///
    /// Only `reset` and `clear` are accepted until the container is rebuilt.
    #[error("container is poisoned by an earlier failed heap repair")]
    Poisoned,
}

/// Why undoing a failed insert did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollbackFailure {
    /// Removing the inserted element failed on a comparison.
    #[error(transparent)]
    Compare(CompareError),

    /// The inserted element could not be found.
    #[error("inserted item could not be located")]
    NotFound,
}
