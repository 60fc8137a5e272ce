//! Priority queue over a plain heap.

use std::ops::ControlFlow;
use std::slice;

use parking_lot::{MappedRwLockReadGuard, RwLockReadGuard};
use tracing::{debug, error};

use crate::compare::Comparable;
use crate::config::QueueConfig;
use crate::error::{Error, Result, RollbackFailure};
use crate::heap::{Fault, Heap, Mode, Polarity};
use crate::sync::Locked;

/// A priority queue with atomic enqueue.
///
/// If a comparison fails while an element is being enqueued, the element is
/// removed again and the queue is left exactly as it was before the call.
///
/// For shared use across threads wrap it in [`Locked`]
/// ([`SyncPriorityQueue`](crate::SyncPriorityQueue)).
///
/// # Example
///
/// ```
/// use nexus_heap::{DynValue, Polarity, PriorityQueue};
///
/// let mut queue = PriorityQueue::new(Polarity::Min);
/// queue.enqueue(DynValue::new(3)).unwrap();
/// queue.enqueue(DynValue::new(1)).unwrap();
///
/// // A value of another type cannot be ordered against the residents.
/// assert!(queue.enqueue(DynValue::new("two")).is_err());
/// assert_eq!(queue.len(), 2);
///
/// assert_eq!(queue.dequeue().unwrap().downcast_ref::<i32>(), Some(&1));
/// ```
#[derive(Debug)]
pub struct PriorityQueue<T> {
    heap: Heap<T>,
    poisoned: bool,
}

impl<T: Comparable> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new(Polarity::Min)
    }
}

impl<T: Comparable> PriorityQueue<T> {
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

    /// Creates a queue holding `items`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCapacity`] if the configured capacity cannot be
    /// allocated, or [`Error::Compare`] if the items cannot be ordered.
    pub fn from_vec(mut items: Vec<T>, config: &QueueConfig) -> Result<Self> {
        items
            .try_reserve_exact(config.capacity.saturating_sub(items.len()))
            .map_err(|_| Error::InvalidCapacity {
                requested: config.capacity,
            })?;
        let heap = Heap::from_vec(items, config.polarity).map_err(|fault| fault.source)?;
        Ok(Self {
            heap,
            poisoned: false,
        })
    }

    /// Returns the number of queued elements.
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

    /// Returns the next element to be dequeued.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.heap.top()
    }

    /// Iterates the elements in unspecified order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.heap.iter()
    }

    /// Visits every element in unspecified order until `visit` breaks.
    pub fn scan<B, F>(&self, visit: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        self.heap.iter().try_for_each(visit)
    }

    /// Inserts `x`.
    ///
    /// # Errors
    ///
    /// - [`Error::Compare`]: `x` could not be ordered; it is dropped and the
    ///   queue is unchanged.
    /// - [`Error::Corrupted`]: removing `x` again failed; the queue is poisoned.
    /// - [`Error::Poisoned`]
    pub fn enqueue(&mut self, x: T) -> Result<()> {
        self.check_poisoned()?;
        let Err(fault) = self.heap.push(x) else {
            return Ok(());
        };
        // The sift reports where the new element stopped.
        let slot = fault.slot;
        let err = rollback_push(&mut self.heap, Some(slot), fault);
        self.poisoned = matches!(err, Error::Corrupted { .. });
        Err(err)
    }

    /// Removes and returns the next element.
    ///
    /// # Errors
    ///
    /// - [`Error::Empty`]
    /// - [`Error::Compare`]: the heap could not be repaired; the element stays
    ///   queued and the queue is poisoned.
    /// - [`Error::Poisoned`]
    pub fn dequeue(&mut self) -> Result<T> {
        self.check_poisoned()?;
        match self.heap.pop() {
            Ok(Some(x)) => Ok(x),
            Ok(None) => Err(Error::Empty),
            Err(fault) => Err(self.poison(fault)),
        }
    }

    /// Drops every element and allocates exactly `capacity`.
    ///
    /// Clears poisoning.
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

    /// Drops every element and releases the backing storage.
    ///
    /// Clears poisoning.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.poisoned = false;
    }

    /// Consumes the queue, returning the elements in unspecified order.
    pub fn into_vec(self) -> Vec<T> {
        let mut heap = self.heap;
        let mut out = Vec::with_capacity(heap.len());
        while let Some(x) = heap.pop_raw() {
            out.push(x);
        }
        out
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

/// Undoes a push whose sift failed by removing the element at `slot`.
///
/// Returns the error to surface: the original comparison error if the
/// removal succeeded, [`Error::Corrupted`] otherwise.
pub(crate) fn rollback_push<E, M>(heap: &mut Heap<E, M>, slot: Option<usize>, fault: Fault) -> Error
where
    E: Comparable,
    M: Mode<E>,
{
    let original = fault.source;
    let rollback = match slot.map(|slot| heap.remove_at(slot)) {
        Some(Ok(Some(_))) => {
            debug!(slot = fault.slot, error = %original, "rolled back failed push");
            return Error::Compare(original);
        }
        Some(Ok(None)) | None => RollbackFailure::NotFound,
        Some(Err(second)) => RollbackFailure::Compare(second.source),
    };
    error!(error = %original, %rollback, "push rollback failed; container poisoned");
    Error::Corrupted { original, rollback }
}

// =============================================================================
// Synchronized facade
// =============================================================================

impl<T: Comparable> Locked<PriorityQueue<T>> {
    /// Creates an empty locked queue from `config`.
    pub fn with_config(config: &QueueConfig) -> Result<Self> {
        PriorityQueue::with_config(config).map(Self::new)
    }

    /// See [`PriorityQueue::len`].
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// See [`PriorityQueue::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// See [`PriorityQueue::capacity`].
    pub fn capacity(&self) -> usize {
        self.read().capacity()
    }

    /// See [`PriorityQueue::polarity`].
    pub fn polarity(&self) -> Polarity {
        self.read().polarity()
    }

    /// See [`PriorityQueue::is_poisoned`].
    pub fn is_poisoned(&self) -> bool {
        self.read().is_poisoned()
    }

    /// Returns the next element under a shared lock.
    ///
    /// Writers block until the guard is dropped.
    pub fn peek(&self) -> Option<MappedRwLockReadGuard<'_, T>> {
        RwLockReadGuard::try_map(self.read(), |queue| queue.peek()).ok()
    }

    /// See [`PriorityQueue::scan`]. Holds the shared lock throughout.
    pub fn scan<B, F>(&self, visit: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        self.read().scan(visit)
    }

    /// See [`PriorityQueue::enqueue`].
    pub fn enqueue(&self, x: T) -> Result<()> {
        self.write().enqueue(x)
    }

    /// See [`PriorityQueue::dequeue`].
    pub fn dequeue(&self) -> Result<T> {
        self.write().dequeue()
    }

    /// See [`PriorityQueue::reset`].
    pub fn reset(&self, capacity: usize) -> Result<()> {
        self.write().reset(capacity)
    }

    /// See [`PriorityQueue::clear`].
    pub fn clear(&self) {
        self.write().clear();
    }
}
