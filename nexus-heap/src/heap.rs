//! Array-backed binary heap with optional position tracking.
//!
//! [`Heap`] is a classic implicit binary heap over a `Vec`. In indexed mode
//! every element is a [`Handle`] and the heap writes each handle's array
//! position into it whenever the element moves, enabling O(log n) update and
//! removal by handle. Indexed mode is internal to
//! [`IndexedPriorityQueue`](crate::IndexedPriorityQueue), which admits a handle
//! only while it is vacant; a public heap can never relocate a handle.
//!
//! Comparisons are fallible ([`Comparable`]). A comparison that fails during a
//! sift aborts the sift where it stands and is reported as a [`Fault`]: the
//! element count is whatever the operation had reached, and heap order may be
//! violated at the reported slot. The heap does not repair itself; the queues
//! built on top of it do.

use std::collections::TryReserveError;
use std::marker::PhantomData;
use std::slice;

use thiserror::Error;

use crate::compare::{Comparable, CompareError};
use crate::handle::Handle;

/// Which end of the order sits at the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// Root is the smallest element.
    #[default]
    Min,
    /// Root is the largest element.
    Max,
}

/// A comparison failed while restoring heap order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("heap repair failed at slot {slot}: {source}")]
pub struct Fault {
    /// Position of the element being sifted when the comparison failed.
    pub slot: usize,
    /// The comparison error.
    #[source]
    pub source: CompareError,
}

mod sealed {
    pub trait Sealed {}

    /// Proof that the caller is this crate.
    pub struct Token(());

    #[inline]
    pub(crate) const fn token() -> Token {
        Token(())
    }
}

/// Position tracking strategy of a [`Heap`].
///
/// Sealed. [`Untracked`] is the only public mode; the tracking mode belongs
/// to [`IndexedPriorityQueue`](crate::IndexedPriorityQueue).
pub trait Mode<E>: sealed::Sealed {
    /// `true` if the heap records element positions.
    const INDEXED: bool;

    #[doc(hidden)]
    fn relocate(item: &E, slot: Option<usize>, token: sealed::Token);

    #[doc(hidden)]
    fn is_resident(item: &E, token: sealed::Token) -> bool;
}

/// Plain heap: elements do not learn their position.
#[derive(Debug, Clone, Copy, Default)]
pub struct Untracked;

/// Indexed heap: every [`Handle`] mirrors its array position.
#[derive(Debug)]
pub(crate) enum Tracked {}

impl sealed::Sealed for Untracked {}
impl sealed::Sealed for Tracked {}

impl<E> Mode<E> for Untracked {
    const INDEXED: bool = false;

    #[inline]
    fn relocate(_: &E, _: Option<usize>, _: sealed::Token) {}

    #[inline]
    fn is_resident(_: &E, _: sealed::Token) -> bool {
        false
    }
}

impl<T> Mode<Handle<T>> for Tracked {
    const INDEXED: bool = true;

    #[inline]
    fn relocate(item: &Handle<T>, slot: Option<usize>, _: sealed::Token) {
        item.set_slot(slot);
    }

    #[inline]
    fn is_resident(item: &Handle<T>, _: sealed::Token) -> bool {
        item.is_queued()
    }
}

/// Binary heap over a `Vec`.
///
/// # Example
///
/// ```
/// use nexus_heap::{Heap, Polarity};
///
/// let mut heap: Heap<i32> = Heap::with_capacity(8, Polarity::Max);
/// for x in [3, 9, 1] {
///     heap.push(x).unwrap();
/// }
///
/// assert_eq!(heap.top(), Some(&9));
/// assert_eq!(heap.pop().unwrap(), Some(9));
/// assert_eq!(heap.pop().unwrap(), Some(3));
/// ```
///
/// A public heap of handles does not track them; only an
/// [`IndexedPriorityQueue`](crate::IndexedPriorityQueue) writes slots:
///
/// ```
/// use nexus_heap::{Handle, Heap, IndexedPriorityQueue, Polarity};
///
/// let mut queue = IndexedPriorityQueue::new(Polarity::Min);
/// let a = Handle::new(5);
/// queue.enqueue(a.clone()).unwrap();
///
/// let mut heap: Heap<Handle<i32>> = Heap::new(Polarity::Min);
/// heap.push(a.clone()).unwrap();
/// assert_eq!(a.slot(), Some(0));
/// assert!(queue.contains(&a));
/// ```
///
/// The tracking mode cannot be named outside the crate:
///
/// ```compile_fail
/// use nexus_heap::heap::Tracked;
/// ```
#[derive(Debug)]
pub struct Heap<E, M = Untracked> {
    items: Vec<E>,
    polarity: Polarity,
    _mode: PhantomData<fn() -> M>,
}

impl<E: Comparable, M: Mode<E>> Default for Heap<E, M> {
    fn default() -> Self {
        Self::new(Polarity::Min)
    }
}

impl<E: Comparable, M: Mode<E>> Heap<E, M> {
    /// Creates an empty heap without allocating.
    #[inline]
    pub const fn new(polarity: Polarity) -> Self {
        Self {
            items: Vec::new(),
            polarity,
            _mode: PhantomData,
        }
    }

    /// Creates an empty heap with room for `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if the allocation fails. See [`try_with_capacity`](Self::try_with_capacity).
    pub fn with_capacity(capacity: usize, polarity: Polarity) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            polarity,
            _mode: PhantomData,
        }
    }

    /// Creates an empty heap with room for exactly `capacity` elements.
    pub fn try_with_capacity(capacity: usize, polarity: Polarity) -> Result<Self, TryReserveError> {
        let mut heap = Self::new(polarity);
        heap.items.try_reserve_exact(capacity)?;
        Ok(heap)
    }

    /// Builds a heap from an initial set of elements in O(n).
    ///
    /// On failure the elements are dropped. Handles passed in indexed mode are
    /// left vacant.
    pub fn from_vec(items: Vec<E>, polarity: Polarity) -> Result<Self, Fault> {
        let mut heap = Self {
            items,
            polarity,
            _mode: PhantomData,
        };
        for (slot, item) in heap.items.iter().enumerate() {
            debug_assert!(!M::is_resident(item, sealed::token()), "element already resident");
            M::relocate(item, Some(slot), sealed::token());
        }
        let len = heap.items.len();
        for i in (0..len / 2).rev() {
            if let Err(fault) = heap.sift_down(i, len) {
                heap.clear();
                return Err(fault);
            }
        }
        Ok(heap)
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the heap holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the capacity of the backing storage.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Returns the configured polarity.
    #[inline]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Returns the element at slot `i`, or `None` if out of range.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&E> {
        self.items.get(i)
    }

    /// Returns the root element without removing it.
    #[inline]
    pub fn top(&self) -> Option<&E> {
        self.items.first()
    }

    /// Iterates elements in array order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, E> {
        self.items.iter()
    }

    /// Returns the backing array.
    #[inline]
    pub fn as_slice(&self) -> &[E] {
        &self.items
    }

    // ========================================================================
    // Ordered operations
    // ========================================================================

    /// Pushes `x` and sifts it up.
    ///
    /// # Errors
    ///
    /// On a failed comparison `x` stays resident at [`Fault::slot`] and
    /// heap order may be violated there.
    pub fn push(&mut self, x: E) -> Result<(), Fault> {
        self.push_raw(x);
        self.sift_up(self.items.len() - 1).map(|_| ())
    }

    /// Removes and returns the root.
    ///
    /// Returns `Ok(None)` if the heap is empty.
    ///
    /// # Errors
    ///
    /// On a failed comparison the root has already been swapped to the last
    /// slot and is still resident; heap order may be violated at
    /// [`Fault::slot`].
    pub fn pop(&mut self) -> Result<Option<E>, Fault> {
        let Some(last) = self.items.len().checked_sub(1) else {
            return Ok(None);
        };
        self.swap(0, last);
        self.sift_down(0, last)?;
        Ok(self.pop_raw())
    }

    /// Removes and returns the element at slot `i`.
    ///
    /// Returns `Ok(None)` if `i` is out of range.
    ///
    /// # Errors
    ///
    /// On a failed comparison the target is still resident in the last slot.
    pub fn remove_at(&mut self, i: usize) -> Result<Option<E>, Fault> {
        let len = self.items.len();
        if i >= len {
            return Ok(None);
        }
        let last = len - 1;
        if i != last {
            self.swap(i, last);
            if !self.sift_down(i, last)? {
                self.sift_up(i)?;
            }
        }
        Ok(self.pop_raw())
    }

    /// Restores heap order after the element at slot `i` changed.
    ///
    /// Returns `Ok(false)` if `i` is out of range.
    pub fn fix(&mut self, i: usize) -> Result<bool, Fault> {
        if i >= self.items.len() {
            return Ok(false);
        }
        if !self.sift_down(i, self.items.len())? {
            self.sift_up(i)?;
        }
        Ok(true)
    }

    /// Replaces the element at slot `i` and restores heap order.
    ///
    /// Returns `Ok(Ok(old))` with the displaced element, or `Ok(Err(x))`
    /// handing `x` back if `i` is out of range.
    ///
    /// # Errors
    ///
    /// On a failed comparison the displaced element is dropped and heap order
    /// may be violated at [`Fault::slot`].
    pub fn set(&mut self, i: usize, x: E) -> Result<Result<E, E>, Fault> {
        if i >= self.items.len() {
            return Ok(Err(x));
        }
        let old = self.set_raw(i, x);
        self.fix(i)?;
        Ok(Ok(old))
    }

    /// Replaces the root and sifts the new root down.
    ///
    /// Pushes instead if the heap is empty. Returns the displaced root.
    ///
    /// # Errors
    ///
    /// As for [`set`](Self::set).
    pub fn replace_top(&mut self, x: E) -> Result<Option<E>, Fault> {
        if self.items.is_empty() {
            self.push(x)?;
            return Ok(None);
        }
        let old = self.set_raw(0, x);
        self.sift_down(0, self.items.len())?;
        Ok(Some(old))
    }

    /// Drops every element and installs storage of exactly `capacity`.
    pub fn reset(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        let mut items = Vec::new();
        items.try_reserve_exact(capacity)?;
        self.vacate_all();
        self.items = items;
        Ok(())
    }

    /// Drops every element and releases the backing storage.
    pub fn clear(&mut self) {
        self.vacate_all();
        self.items = Vec::new();
    }

    fn vacate_all(&self) {
        if M::INDEXED {
            for item in &self.items {
                M::relocate(item, None, sealed::token());
            }
        }
    }

    // ========================================================================
    // Raw protocol
    //
    // None of these restore heap order. Every reordering goes through
    // `swap`, which keeps tracked positions in sync.
    // ========================================================================

    #[inline]
    fn less(&self, i: usize, j: usize) -> Result<bool, CompareError> {
        match self.polarity {
            Polarity::Min => self.items[i].less(&self.items[j]),
            Polarity::Max => self.items[j].less(&self.items[i]),
        }
    }

    #[inline]
    pub(crate) fn swap(&mut self, i: usize, j: usize) {
        self.items.swap(i, j);
        M::relocate(&self.items[i], Some(i), sealed::token());
        M::relocate(&self.items[j], Some(j), sealed::token());
    }

    pub(crate) fn set_raw(&mut self, i: usize, x: E) -> E {
        debug_assert!(!M::is_resident(&x, sealed::token()), "element already resident");
        M::relocate(&x, Some(i), sealed::token());
        let old = std::mem::replace(&mut self.items[i], x);
        M::relocate(&old, None, sealed::token());
        old
    }

    #[inline]
    pub(crate) fn push_raw(&mut self, x: E) {
        debug_assert!(!M::is_resident(&x, sealed::token()), "element already resident");
        M::relocate(&x, Some(self.items.len()), sealed::token());
        self.items.push(x);
    }

    #[inline]
    pub(crate) fn pop_raw(&mut self) -> Option<E> {
        let x = self.items.pop()?;
        M::relocate(&x, None, sealed::token());
        Some(x)
    }

    /// Moves the element at `j` toward the root. Returns its final slot.
    fn sift_up(&mut self, mut j: usize) -> Result<usize, Fault> {
        while j > 0 {
            let parent = (j - 1) / 2;
            match self.less(j, parent) {
                Ok(true) => {
                    self.swap(j, parent);
                    j = parent;
                }
                Ok(false) => break,
                Err(source) => return Err(Fault { slot: j, source }),
            }
        }
        Ok(j)
    }

    /// Moves the element at `i0` toward the leaves within `[0, n)`.
    /// Returns `true` if it moved.
    fn sift_down(&mut self, i0: usize, n: usize) -> Result<bool, Fault> {
        let mut i = i0;
        loop {
            let left = 2 * i + 1;
            if left >= n {
                break;
            }
            let fault = move |source| Fault { slot: i, source };

            let mut child = left;
            let right = left + 1;
            if right < n && self.less(right, left).map_err(fault)? {
                child = right;
            }
            if !self.less(child, i).map_err(fault)? {
                break;
            }
            self.swap(i, child);
            i = child;
        }
        Ok(i > i0)
    }
}

impl<'a, E, M> IntoIterator for &'a Heap<E, M> {
    type Item = &'a E;
    type IntoIter = slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
pub(crate) fn assert_heap_order<E, M>(heap: &Heap<E, M>)
where
    E: Comparable + std::fmt::Debug,
    M: Mode<E>,
{
    for i in 1..heap.len() {
        let parent = (i - 1) / 2;
        assert!(
            !heap.less(i, parent).unwrap(),
            "heap order violated between slot {parent} and {i}: {:?}",
            heap.as_slice()
        );
    }
}
