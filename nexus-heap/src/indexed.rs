//! Priority queue of handles with O(log n) update and removal.

use std::ops::ControlFlow;
use std::slice;

use tracing::error;

use crate::compare::Comparable;
use crate::config::QueueConfig;
use crate::error::{Error, Result, RollbackFailure};
use crate::handle::Handle;
use crate::heap::{Fault, Heap, Polarity, Tracked};
use crate::pqueue::rollback_push;
use crate::sync::Locked;

/// A priority queue of [`Handle`]s.
///
/// Every resident handle records its own heap slot, so [`update`](Self::update)
/// and [`remove`](Self::remove) locate it directly instead of scanning.
///
/// # Example
///
/// ```
/// use nexus_heap::{Handle, IndexedPriorityQueue, Polarity};
///
/// let mut timers = IndexedPriorityQueue::new(Polarity::Min);
/// let a = Handle::new(30);
/// let b = Handle::new(10);
/// let c = Handle::new(20);
/// for h in [&a, &b, &c] {
///     timers.enqueue(h.clone()).unwrap();
/// }
///
/// // Reschedule `a` ahead of everything, cancel `c`.
/// assert_eq!(timers.update(&a, 5).unwrap(), 30);
/// timers.remove(&c).unwrap();
///
/// assert!(timers.dequeue().unwrap().ptr_eq(&a));
/// assert!(timers.dequeue().unwrap().ptr_eq(&b));
/// assert!(timers.is_empty());
/// ```
#[derive(Debug)]
pub struct IndexedPriorityQueue<T> {
    heap: Heap<Handle<T>, Tracked>,
    poisoned: bool,
}

impl<T: Comparable> Default for IndexedPriorityQueue<T> {
    fn default() -> Self {
        Self::new(Polarity::Min)
    }
}

impl<T: Comparable> IndexedPriorityQueue<T> {
    /// Creates an empty queue without allocating.
    pub const fn new(polarity: Polarity) -> Self {
        Self {
            heap: Heap::new(polarity),
            poisoned: false,
        }
    }

    /// Creates an empty queue from `config`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCapacity`] if the capacity cannot be allocated.
    pub fn with_config(config: &QueueConfig) -> Result<Self> {
        let heap = Heap::try_with_capacity(config.capacity, config.polarity).map_err(|_| {
            Error::InvalidCapacity {
                requested: config.capacity,
            }
        })?;
        Ok(Self {
            heap,
            poisoned: false,
        })
    }

    /// Returns the number of queued handles.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the backing capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }

    /// Returns the configured polarity.
    #[inline]
    pub fn polarity(&self) -> Polarity {
        self.heap.polarity()
    }

    /// Returns `true` if an earlier failure left heap order unrepaired.
    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Returns the next handle to be dequeued.
    #[inline]
    pub fn peek(&self) -> Option<&Handle<T>> {
        self.heap.top()
    }

    /// Returns `true` if `handle` is resident in this queue.
    #[inline]
    pub fn contains(&self, handle: &Handle<T>) -> bool {
        self.position(handle).is_some()
    }

    /// Iterates the handles in unspecified order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Handle<T>> {
        self.heap.iter()
    }

    /// Visits every handle in unspecified order until `visit` breaks.
    pub fn scan<B, F>(&self, visit: F) -> ControlFlow<B>
    where
        F: FnMut(&Handle<T>) -> ControlFlow<B>,
    {
        self.heap.iter().try_for_each(visit)
    }

    /// Inserts `handle`.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyQueued`]: the handle is resident in a queue.
    /// - [`Error::Compare`]: the handle could not be ordered; the queue is
    ///   unchanged and the handle is vacant again.
    /// - [`Error::Corrupted`]: removing the handle again failed; the queue is
    ///   poisoned.
    /// - [`Error::Poisoned`]
    pub fn enqueue(&mut self, handle: Handle<T>) -> Result<()> {
        self.check_poisoned()?;
        if handle.is_queued() {
            return Err(Error::AlreadyQueued);
        }
        let candidate = handle.clone();
        let Err(fault) = self.heap.push(handle) else {
            return Ok(());
        };
        let slot = self.locate(&candidate);
        let err = rollback_push(&mut self.heap, slot, fault);
        self.poisoned = matches!(err, Error::Corrupted { .. });
        Err(err)
    }

    /// Removes and returns the next handle.
    ///
    /// # Errors
    ///
    /// - [`Error::Empty`]
    /// - [`Error::Compare`]: the heap could not be repaired; the handle stays
    ///   queued and the queue is poisoned.
    /// - [`Error::Poisoned`]
    pub fn dequeue(&mut self) -> Result<Handle<T>> {
        self.check_poisoned()?;
        match self.heap.pop() {
            Ok(Some(handle)) => Ok(handle),
            Ok(None) => Err(Error::Empty),
            Err(fault) => Err(self.poison(fault)),
        }
    }

    /// Replaces the value of a resident handle and restores heap order.
    ///
    /// Returns the previous value.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInQueue`]: the handle is not resident here.
    /// - [`Error::Compare`]: `value` could not be ordered; the previous value
    ///   is restored.
    /// - [`Error::Corrupted`]: restoring the previous value failed too; the
    ///   queue is poisoned.
    /// - [`Error::Poisoned`]
    pub fn update(&mut self, handle: &Handle<T>, value: T) -> Result<T> {
        self.check_poisoned()?;
        let slot = self.position(handle).ok_or(Error::NotInQueue)?;
        let previous = handle.replace(value);
        let Err(fault) = self.heap.fix(slot) else {
            return Ok(previous);
        };

        // The handle may have moved before the fault; its slot says where.
        handle.replace(previous);
        let restored = match self.locate(handle) {
            Some(slot) => self
                .heap
                .fix(slot)
                .map(|_| ())
                .map_err(|f| RollbackFailure::Compare(f.source)),
            None => Err(RollbackFailure::NotFound),
        };
        match restored {
            Ok(()) => Err(Error::Compare(fault.source)),
            Err(rollback) => {
                error!(error = %fault.source, %rollback, "update rollback failed; queue poisoned");
                self.poisoned = true;
                Err(Error::Corrupted {
                    original: fault.source,
                    rollback,
                })
            }
        }
    }

    /// Removes a resident handle.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInQueue`]: the handle is not resident here.
    /// - [`Error::Compare`]: the heap could not be repaired; the handle stays
    ///   queued and the queue is poisoned.
    /// - [`Error::Poisoned`]
    pub fn remove(&mut self, handle: &Handle<T>) -> Result<()> {
        self.check_poisoned()?;
        let slot = self.position(handle).ok_or(Error::NotInQueue)?;
        match self.heap.remove_at(slot) {
            Ok(_) => Ok(()),
            Err(fault) => Err(self.poison(fault)),
        }
    }

    /// Drops every handle and allocates exactly `capacity`.
    ///
    /// Removed handles become vacant. Clears poisoning.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCapacity`] if the allocation fails; the queue is
    /// unchanged.
    pub fn reset(&mut self, capacity: usize) -> Result<()> {
        self.heap
            .reset(capacity)
            .map_err(|_| Error::InvalidCapacity {
                requested: capacity,
            })?;
        self.poisoned = false;
        Ok(())
    }

    /// Drops every handle and releases the backing storage.
    ///
    /// Removed handles become vacant. Clears poisoning.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.poisoned = false;
    }

    /// Slot of `handle` if it is resident in this queue.
    #[inline]
    fn position(&self, handle: &Handle<T>) -> Option<usize> {
        let slot = handle.slot()?;
        self.heap
            .get(slot)
            .filter(|resident| resident.ptr_eq(handle))
            .map(|_| slot)
    }

    /// Like [`position`](Self::position), falling back to a scan if the
    /// recorded slot is stale.
    fn locate(&self, handle: &Handle<T>) -> Option<usize> {
        self.position(handle)
            .or_else(|| self.heap.iter().position(|resident| resident.ptr_eq(handle)))
    }

    #[inline]
    fn check_poisoned(&self) -> Result<()> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        Ok(())
    }

    fn poison(&mut self, fault: Fault) -> Error {
        error!(slot = fault.slot, error = %fault.source, "heap repair failed; queue poisoned");
        self.poisoned = true;
        Error::Compare(fault.source)
    }
}

// =============================================================================
// Synchronized facade
// =============================================================================

impl<T: Comparable> Locked<IndexedPriorityQueue<T>> {
    /// Creates an empty locked queue from `config`.
    pub fn with_config(config: &QueueConfig) -> Result<Self> {
        IndexedPriorityQueue::with_config(config).map(Self::new)
    }

    /// See [`IndexedPriorityQueue::len`].
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// See [`IndexedPriorityQueue::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// See [`IndexedPriorityQueue::capacity`].
    pub fn capacity(&self) -> usize {
        self.read().capacity()
    }

    /// See [`IndexedPriorityQueue::polarity`].
    pub fn polarity(&self) -> Polarity {
        self.read().polarity()
    }

    /// See [`IndexedPriorityQueue::is_poisoned`].
    pub fn is_poisoned(&self) -> bool {
        self.read().is_poisoned()
    }

    /// Returns a clone of the next handle.
    pub fn peek(&self) -> Option<Handle<T>> {
        self.read().peek().cloned()
    }

    /// See [`IndexedPriorityQueue::contains`].
    pub fn contains(&self, handle: &Handle<T>) -> bool {
        self.read().contains(handle)
    }

    /// See [`IndexedPriorityQueue::scan`]. Holds the shared lock throughout.
    pub fn scan<B, F>(&self, visit: F) -> ControlFlow<B>
    where
        F: FnMut(&Handle<T>) -> ControlFlow<B>,
    {
        self.read().scan(visit)
    }

    /// See [`IndexedPriorityQueue::enqueue`].
    pub fn enqueue(&self, handle: Handle<T>) -> Result<()> {
        self.write().enqueue(handle)
    }

    /// See [`IndexedPriorityQueue::dequeue`].
    pub fn dequeue(&self) -> Result<Handle<T>> {
        self.write().dequeue()
    }

    /// See [`IndexedPriorityQueue::update`].
    pub fn update(&self, handle: &Handle<T>, value: T) -> Result<T> {
        self.write().update(handle, value)
    }

    /// See [`IndexedPriorityQueue::remove`].
    pub fn remove(&self, handle: &Handle<T>) -> Result<()> {
        self.write().remove(handle)
    }

    /// See [`IndexedPriorityQueue::reset`].
    pub fn reset(&self, capacity: usize) -> Result<()> {
        self.write().reset(capacity)
    }

    /// See [`IndexedPriorityQueue::clear`].
    pub fn clear(&self) {
        self.write().clear();
    }
}
