//! Reader/writer locked containers.
//!
//! [`Locked`] wraps any container in a [`parking_lot::RwLock`]. Each
//! container module adds `&self` facade methods on `Locked<Container>` that
//! take the lock once and delegate to the unlocked core. Core methods never
//! call back into a facade, so no operation can deadlock on its own lock.
//!
//! Reads (`len`, `capacity`, `peek`, `scan`) take the shared lock; mutations
//! take the exclusive lock for their whole duration, so no reader observes a
//! heap mid-repair.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::indexed::IndexedPriorityQueue;
use crate::pqueue::PriorityQueue;
use crate::topk::TopKBuffer;

/// A container guarded by one reader/writer lock.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use nexus_heap::{Polarity, PriorityQueue, SyncPriorityQueue};
///
/// let queue = Arc::new(SyncPriorityQueue::new(PriorityQueue::new(Polarity::Min)));
///
/// let workers: Vec<_> = (0..4)
///     .map(|t| {
///         let queue = Arc::clone(&queue);
///         thread::spawn(move || {
///             for i in 0..100 {
///                 queue.enqueue(t * 100 + i).unwrap();
///             }
///         })
///     })
///     .collect();
/// for w in workers {
///     w.join().unwrap();
/// }
///
/// assert_eq!(queue.len(), 400);
/// assert_eq!(queue.dequeue().unwrap(), 0);
/// ```
#[derive(Debug, Default)]
pub struct Locked<C> {
    inner: RwLock<C>,
}

/// Thread-safe [`PriorityQueue`].
pub type SyncPriorityQueue<T> = Locked<PriorityQueue<T>>;

/// Thread-safe [`IndexedPriorityQueue`].
pub type SyncIndexedPriorityQueue<T> = Locked<IndexedPriorityQueue<T>>;

/// Thread-safe [`TopKBuffer`].
pub type SyncTopKBuffer<T> = Locked<TopKBuffer<T>>;

impl<C> Locked<C> {
    /// Wraps `container`.
    pub fn new(container: C) -> Self {
        Self {
            inner: RwLock::new(container),
        }
    }

    /// Unwraps the container.
    pub fn into_inner(self) -> C {
        self.inner.into_inner()
    }

    /// Acquires the shared lock.
    ///
    /// Use to run several reads against one consistent state.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, C> {
        self.inner.read()
    }

    /// Acquires the exclusive lock.
    ///
    /// Use to run several operations atomically. Calling facade methods on
    /// this `Locked` while holding the guard deadlocks; call the container's
    /// own methods through the guard instead.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, C> {
        self.inner.write()
    }

    /// Mutable access without locking; the borrow proves exclusivity.
    #[inline]
    pub fn get_mut(&mut self) -> &mut C {
        self.inner.get_mut()
    }
}

impl<C> From<C> for Locked<C> {
    fn from(container: C) -> Self {
        Self::new(container)
    }
}
