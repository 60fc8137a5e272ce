//! Sentinel-encoded heap slot.
//!
//! A [`Handle`](crate::Handle) records the array position it occupies in an
//! indexed heap. The position lives in an atomic so a handle can be read from
//! any thread, and uses a reserved sentinel (`usize::MAX`) instead of an
//! `Option` so the cell stays a single word.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Sentinel value meaning "not resident in any heap".
///
/// Never a valid position: a `Vec` cannot hold `usize::MAX` elements.
pub(crate) const VACANT: usize = usize::MAX;

/// Heap position of a single item.
///
/// Written only by the heap's relocation machinery, which runs while the
/// owning container is exclusively borrowed or locked; that borrow provides
/// the ordering, so accesses are relaxed.
#[derive(Debug)]
pub(crate) struct SlotCell(AtomicUsize);

impl SlotCell {
    #[inline]
    pub(crate) const fn vacant() -> Self {
        Self(AtomicUsize::new(VACANT))
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<usize> {
        match self.0.load(Ordering::Relaxed) {
            VACANT => None,
            slot => Some(slot),
        }
    }

    #[inline]
    pub(crate) fn set(&self, slot: Option<usize>) {
        debug_assert_ne!(slot, Some(VACANT), "slot collides with sentinel");
        self.0.store(slot.unwrap_or(VACANT), Ordering::Relaxed);
    }
}

impl Default for SlotCell {
    fn default() -> Self {
        Self::vacant()
    }
}
