//! Construction options shared by the queues.

use crate::heap::Polarity;

/// Options for building a priority queue.
///
/// Indexed mode and locking are chosen by type: build an
/// [`IndexedPriorityQueue`](crate::IndexedPriorityQueue) for O(log n)
/// update/remove by handle, and wrap in [`Locked`](crate::Locked) for
/// shared use across threads.
///
/// # Example
///
/// ```
/// use nexus_heap::{PriorityQueue, QueueConfig, SyncPriorityQueue};
///
/// let config = QueueConfig::new().capacity(64).max();
///
/// let mut local: PriorityQueue<u32> = PriorityQueue::with_config(&config).unwrap();
/// let shared: SyncPriorityQueue<u32> = SyncPriorityQueue::with_config(&config).unwrap();
///
/// local.enqueue(1).unwrap();
/// shared.enqueue(1).unwrap();
/// assert_eq!(local.capacity(), 64);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueConfig {
    pub(crate) capacity: usize,
    pub(crate) polarity: Polarity,
}

impl QueueConfig {
    /// Min-oriented, no pre-allocation.
    pub const fn new() -> Self {
        Self {
            capacity: 0,
            polarity: Polarity::Min,
        }
    }

    /// Sets the initial backing capacity.
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the polarity.
    pub const fn polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Smallest element first.
    pub const fn min(self) -> Self {
        self.polarity(Polarity::Min)
    }

    /// Largest element first.
    pub const fn max(self) -> Self {
        self.polarity(Polarity::Max)
    }
}
