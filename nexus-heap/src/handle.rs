//! Shared, position-aware items for indexed queues.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::compare::{Comparable, CompareError};
use crate::slot::SlotCell;

struct Item<T> {
    value: RwLock<T>,
    slot: SlotCell,
}

/// A shared reference to a value that knows its own heap position.
///
/// Cloning a handle is cheap and yields another reference to the same item.
/// While the item is resident in an
/// [`IndexedPriorityQueue`](crate::IndexedPriorityQueue), [`slot`](Self::slot)
/// equals its array position, which lets the queue update or remove it in
/// O(log n).
///
/// Callers can read the value and slot but cannot change either: the value is
/// replaced through [`IndexedPriorityQueue::update`](crate::IndexedPriorityQueue::update)
/// and the slot is maintained by the heap.
///
/// # Example
///
/// ```
/// use nexus_heap::{Handle, IndexedPriorityQueue, Polarity};
///
/// let mut queue = IndexedPriorityQueue::new(Polarity::Min);
/// let a = Handle::new(10);
/// let b = Handle::new(20);
///
/// assert_eq!(a.slot(), None);
/// queue.enqueue(a.clone()).unwrap();
/// queue.enqueue(b.clone()).unwrap();
/// assert_eq!(a.slot(), Some(0));
///
/// queue.update(&b, 5).unwrap();
/// assert_eq!(b.slot(), Some(0));
/// assert_eq!(b.get(), 5);
/// ```
pub struct Handle<T> {
    inner: Arc<Item<T>>,
}

impl<T> Handle<T> {
    /// Wraps `value` in a new, non-resident handle.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Item {
                value: RwLock::new(value),
                slot: SlotCell::vacant(),
            }),
        }
    }

    /// Runs `f` on the value and returns its result.
    ///
    /// The value is locked for reading only while `f` runs. A queue updating
    /// this handle waits for `f` to return while holding its own lock, so `f`
    /// must not call into a queue.
    ///
    /// ```
    /// use nexus_heap::Handle;
    ///
    /// let h = Handle::new(String::from("job"));
    /// assert_eq!(h.with(|s| s.len()), 3);
    /// ```
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read())
    }

    /// Returns a copy of the value.
    #[inline]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.read().clone()
    }

    /// Returns the item's heap position, or `None` if it is not resident.
    #[inline]
    pub fn slot(&self) -> Option<usize> {
        self.inner.slot.get()
    }

    /// Returns `true` if the item currently sits in a queue.
    #[inline]
    pub fn is_queued(&self) -> bool {
        self.slot().is_some()
    }

    /// Returns `true` if both handles refer to the same item.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Unwraps the value if this is the last handle to the item.
    ///
    /// Returns `Err(self)` if other handles (including one held by a queue)
    /// still exist.
    pub fn into_inner(self) -> Result<T, Self> {
        Arc::try_unwrap(self.inner)
            .map(|item| item.value.into_inner())
            .map_err(|inner| Self { inner })
    }

    #[inline]
    pub(crate) fn set_slot(&self, slot: Option<usize>) {
        self.inner.slot.set(slot);
    }

    #[inline]
    pub(crate) fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.inner.value.write(), value)
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("value", &*self.inner.value.read())
            .field("slot", &self.slot())
            .finish()
    }
}

impl<T: Comparable> Comparable for Handle<T> {
    fn less(&self, other: &Self) -> Result<bool, CompareError> {
        // Same item: also avoids taking its read lock twice.
        if self.ptr_eq(other) {
            return Ok(false);
        }
        self.inner.value.read().less(&other.inner.value.read())
    }
}
