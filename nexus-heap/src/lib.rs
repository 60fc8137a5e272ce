//! Indexed binary heap, priority queues and a top-k buffer.
//!
//! This crate provides heap-based containers whose element ordering may fail,
//! and which keep their invariants when it does.
//!
//! # Design Philosophy
//!
//! Standard heaps assume a total order:
//!
//! ```text
//! BinaryHeap<T: Ord>  - comparison cannot fail, elements are anonymous
//! ```
//!
//! Here ordering is fallible ([`Comparable`]) and elements can be addressed:
//!
//! ```text
//! Heap<E>                   - plain array heap, faults reported with their slot
//! IndexedPriorityQueue<T>   - every handle mirrors its own array position
//! ```
//!
//! Benefits:
//! - **Atomic inserts**: a failed enqueue is rolled back, leaving the
//!   container exactly as before
//! - **O(log n) update/remove**: handles carry their slot, no scanning
//! - **Checked handles**: a handle from another queue, or one already removed,
//!   is rejected instead of corrupting the heap
//! - **Optional locking**: the same containers work unlocked (`&mut self`) or
//!   behind one reader/writer lock ([`Locked`])
//!
//! # Quick Start
//!
//! ```
//! use nexus_heap::{Polarity, PriorityQueue};
//!
//! let mut queue = PriorityQueue::new(Polarity::Min);
//! for x in [3, 0, 9, -4, 3, -5, 8] {
//!     queue.enqueue(x).unwrap();
//! }
//!
//! assert_eq!(queue.dequeue().unwrap(), -5);
//! assert_eq!(queue.dequeue().unwrap(), -4);
//! ```
//!
//! # Updating by Handle
//!
//! ```
//! use nexus_heap::{Handle, IndexedPriorityQueue, Polarity};
//!
//! let mut queue = IndexedPriorityQueue::new(Polarity::Max);
//! let jobs: Vec<_> = [5, 1, 3].into_iter().map(Handle::new).collect();
//! for job in &jobs {
//!     queue.enqueue(job.clone()).unwrap();
//! }
//!
//! // Bump the lowest priority job to the front.
//! queue.update(&jobs[1], 10).unwrap();
//! assert!(queue.peek().unwrap().ptr_eq(&jobs[1]));
//!
//! // A handle that was never enqueued is rejected.
//! let stranger = Handle::new(7);
//! assert!(queue.remove(&stranger).is_err());
//! ```
//!
//! # Top-K
//!
//! ```
//! use nexus_heap::TopKBuffer;
//!
//! let mut top = TopKBuffer::new(2).unwrap();
//! for score in [0.3, 0.9, 0.1, 0.7] {
//!     top.add(score).unwrap();
//! }
//! assert_eq!(top.flush().unwrap(), vec![0.9, 0.7]);
//! ```
//!
//! # Data Structures
//!
//! | Structure | Use Case | Key Operations |
//! |-----------|----------|----------------|
//! | [`Heap`] | Building block | O(log n) push/pop/remove_at/fix |
//! | [`PriorityQueue`] | Scheduling by value | O(log n) enqueue/dequeue, atomic enqueue |
//! | [`IndexedPriorityQueue`] | Timers, reprioritisation | O(log n) update/remove by handle |
//! | [`TopKBuffer`] | Streaming top-k | O(log k) add, descending flush |
//!
//! # Failure Model
//!
//! A failed comparison never panics. Containers return [`Error::Compare`] and
//! are unchanged when the failure can be undone. When it cannot (a rollback
//! itself fails, or a dequeue cannot repair the heap) the container reports
//! it and becomes poisoned: later mutations return [`Error::Poisoned`] until
//! `reset` or `clear`.

#![warn(missing_docs)]

pub mod compare;
pub mod config;
pub mod error;
pub mod handle;
pub mod heap;
pub mod indexed;
pub mod pqueue;
mod slot;
pub mod sync;
pub mod topk;

#[cfg(test)]
mod testing;

pub use compare::{Comparable, CompareError, DynComparable, DynValue, Ordered};
pub use config::QueueConfig;
pub use error::{Error, Result, RollbackFailure};
pub use handle::Handle;
pub use heap::{Fault, Heap, Mode, Polarity, Untracked};
pub use indexed::IndexedPriorityQueue;
pub use pqueue::PriorityQueue;
pub use sync::{Locked, SyncIndexedPriorityQueue, SyncPriorityQueue, SyncTopKBuffer};
pub use topk::TopKBuffer;
