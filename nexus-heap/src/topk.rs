//! Bounded buffer retaining the K largest elements of a stream.

use std::ops::ControlFlow;
use std::slice;

use parking_lot::{MappedRwLockReadGuard, RwLockReadGuard};
use tracing::{error, trace};

use crate::compare::Comparable;
use crate::error::{Error, Result};
use crate::heap::{Fault, Heap, Polarity};
use crate::pqueue::rollback_push;
use crate::sync::Locked;

/// Retains the `k` largest elements seen so far.
///
/// Backed by a min-heap of at most `k` elements whose root is the smallest
/// retained element, the next to be evicted. An incoming element equal to
/// that minimum is discarded, so among equal elements the earliest one wins.
///
/// # Example
///
/// ```
/// use nexus_heap::TopKBuffer;
///
/// let mut top = TopKBuffer::new(3).unwrap();
/// for x in [3, 0, 9, -4, 3, -5, 8] {
///     top.add(x).unwrap();
/// }
/// assert_eq!(top.peek(), Some(&3));
/// assert_eq!(top.flush().unwrap(), vec![9, 8, 3]);
/// assert!(top.is_empty());
/// ```
#[derive(Debug)]
pub struct TopKBuffer<T> {
    heap: Heap<T>,
    k: usize,
    poisoned: bool,
}

impl<T: Comparable> TopKBuffer<T> {
    /// Creates an empty buffer retaining up to `k` elements.
    ///
    /// # Errors
    ///
    /// [`Error::ZeroK`] if `k == 0`, [`Error::InvalidCapacity`] if `k`
    /// elements cannot be allocated.
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::ZeroK);
        }
        let heap = Heap::try_with_capacity(k, Polarity::Min)
            .map_err(|_| Error::InvalidCapacity { requested: k })?;
        Ok(Self {
            heap,
            k,
            poisoned: false,
        })
    }

    /// Returns the number of retained elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if nothing is retained.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the backing capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }

    /// Returns the retention limit.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns `true` if an earlier failure left heap order unrepaired.
    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Returns the smallest retained element.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.heap.top()
    }

    /// Iterates retained elements in unspecified order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.heap.iter()
    }

    /// Visits retained elements in unspecified order until `visit` breaks.
    pub fn scan<B, F>(&self, visit: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        self.heap.iter().try_for_each(visit)
    }

    /// Offers `x` to the buffer.
    ///
    /// Returns `true` if `x` was retained, `false` if it was discarded.
    ///
    /// # Errors
    ///
    /// - [`Error::Compare`]: `x` could not be ordered; the buffer is unchanged.
    /// - [`Error::Corrupted`]: undoing a failed insert failed; the buffer is
    ///   poisoned.
    /// - [`Error::Poisoned`]
    pub fn add(&mut self, x: T) -> Result<bool> {
        self.check_poisoned()?;
        if self.heap.len() < self.k {
            let Err(fault) = self.heap.push(x) else {
                return Ok(true);
            };
            let slot = fault.slot;
            let err = rollback_push(&mut self.heap, Some(slot), fault);
            self.poisoned = matches!(err, Error::Corrupted { .. });
            return Err(err);
        }

        let Some(min) = self.heap.top() else {
            return Ok(false);
        };
        if !min.less(&x)? {
            return Ok(false);
        }
        // A new root is never smaller than its parent; only sift down.
        match self.heap.replace_top(x) {
            Ok(_) => Ok(true),
            Err(fault) => Err(self.poison(fault)),
        }
    }

    /// Changes the retention limit.
    ///
    /// Shrinking evicts the smallest retained elements, which are returned in
    /// ascending order. Growing evicts nothing.
    ///
    /// # Errors
    ///
    /// - [`Error::ZeroK`]
    /// - [`Error::Compare`]: an eviction could not repair the heap; nothing
    ///   is evicted, `k` is unchanged and the buffer is poisoned.
    /// - [`Error::Poisoned`]
    pub fn reset_k(&mut self, k: usize) -> Result<Vec<T>> {
        if k == 0 {
            return Err(Error::ZeroK);
        }
        self.check_poisoned()?;
        let excess = self.heap.len().saturating_sub(k);
        let evicted = self.pop_n(excess)?;
        if excess > 0 {
            trace!(evicted = excess, old_k = self.k, new_k = k, "shrunk top-k buffer");
        }
        self.k = k;
        Ok(evicted)
    }

    /// Drains the buffer, largest element first.
    ///
    /// # Errors
    ///
    /// - [`Error::Compare`]: the heap could not be repaired; every element
    ///   stays in the buffer, which is poisoned.
    /// - [`Error::Poisoned`]
    pub fn flush(&mut self) -> Result<Vec<T>> {
        self.check_poisoned()?;
        let mut out = self.pop_n(self.heap.len())?;
        out.reverse();
        Ok(out)
    }

    /// Drops every element and resets the backing storage to capacity `k`.
    ///
    /// Clears poisoning.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCapacity`] if the allocation fails; the buffer is
    /// unchanged.
    pub fn clear(&mut self) -> Result<()> {
        self.heap
            .reset(self.k)
            .map_err(|_| Error::InvalidCapacity { requested: self.k })?;
        self.poisoned = false;
        Ok(())
    }

    /// Pops up to `n` minima, smallest first. On a fault the popped elements
    /// are put back and the buffer is poisoned.
    fn pop_n(&mut self, n: usize) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            match self.heap.pop() {
                Ok(Some(x)) => out.push(x),
                Ok(None) => break,
                Err(fault) => {
                    for x in out {
                        self.heap.push_raw(x);
                    }
                    return Err(self.poison(fault));
                }
            }
        }
        Ok(out)
    }

    #[inline]
    fn check_poisoned(&self) -> Result<()> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        Ok(())
    }

    fn poison(&mut self, fault: Fault) -> Error {
        error!(slot = fault.slot, error = %fault.source, "heap repair failed; buffer poisoned");
        self.poisoned = true;
        Error::Compare(fault.source)
    }
}

// =============================================================================
// Synchronized facade
// =============================================================================

impl<T: Comparable> Locked<TopKBuffer<T>> {
    /// Creates an empty locked buffer retaining up to `k` elements.
    pub fn with_k(k: usize) -> Result<Self> {
        TopKBuffer::new(k).map(Self::new)
    }

    /// See [`TopKBuffer::len`].
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// See [`TopKBuffer::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// See [`TopKBuffer::capacity`].
    pub fn capacity(&self) -> usize {
        self.read().capacity()
    }

    /// See [`TopKBuffer::k`].
    pub fn k(&self) -> usize {
        self.read().k()
    }

    /// See [`TopKBuffer::is_poisoned`].
    pub fn is_poisoned(&self) -> bool {
        self.read().is_poisoned()
    }

    /// Returns the smallest retained element under a shared lock.
    pub fn peek(&self) -> Option<MappedRwLockReadGuard<'_, T>> {
        RwLockReadGuard::try_map(self.read(), |buffer| buffer.peek()).ok()
    }

    /// See [`TopKBuffer::scan`]. Holds the shared lock throughout.
    pub fn scan<B, F>(&self, visit: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        self.read().scan(visit)
    }

    /// See [`TopKBuffer::add`].
    pub fn add(&self, x: T) -> Result<bool> {
        self.write().add(x)
    }

    /// See [`TopKBuffer::reset_k`].
    pub fn reset_k(&self, k: usize) -> Result<Vec<T>> {
        self.write().reset_k(k)
    }

    /// See [`TopKBuffer::flush`].
    pub fn flush(&self) -> Result<Vec<T>> {
        self.write().flush()
    }

    /// See [`TopKBuffer::clear`].
    pub fn clear(&self) -> Result<()> {
        self.write().clear()
    }
}
