//! Property tests against sorted reference models.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use nexus_heap::{
    Comparable, CompareError, DynValue, Error, Handle, Heap, IndexedPriorityQueue, Mode, Polarity,
    PriorityQueue, TopKBuffer,
};
use proptest::prelude::*;

fn is_heap_ordered<E: Comparable, M: Mode<E>>(heap: &Heap<E, M>) -> bool {
    let items = heap.as_slice();
    (1..items.len()).all(|child| {
        let parent = (child - 1) / 2;
        let inverted = match heap.polarity() {
            Polarity::Min => items[child].less(&items[parent]),
            Polarity::Max => items[parent].less(&items[child]),
        };
        inverted == Ok(false)
    })
}

fn arb_polarity() -> impl Strategy<Value = Polarity> {
    prop_oneof![Just(Polarity::Min), Just(Polarity::Max)]
}

// =============================================================================
// Heap
// =============================================================================

#[derive(Debug, Clone)]
enum HeapOp {
    Push(i32),
    Pop,
    RemoveAt(usize),
    Set(usize, i32),
}

fn arb_heap_op() -> impl Strategy<Value = HeapOp> {
    prop_oneof![
        4 => any::<i32>().prop_map(HeapOp::Push),
        2 => Just(HeapOp::Pop),
        1 => any::<usize>().prop_map(HeapOp::RemoveAt),
        1 => (any::<usize>(), any::<i32>()).prop_map(|(i, x)| HeapOp::Set(i, x)),
    ]
}

proptest! {
    #[test]
    fn heap_matches_sorted_model(
        ops in prop::collection::vec(arb_heap_op(), 0..200),
    ) {
        let mut heap: Heap<i32> = Heap::new(Polarity::Min);
        let mut model: Vec<i32> = Vec::new();

        for op in ops {
            match op {
                HeapOp::Push(x) => {
                    heap.push(x).unwrap();
                    model.push(x);
                }
                HeapOp::Pop => {
                    let popped = heap.pop().unwrap();
                    model.sort_unstable();
                    let expected = (!model.is_empty()).then(|| model.remove(0));
                    prop_assert_eq!(popped, expected);
                }
                HeapOp::RemoveAt(i) if !model.is_empty() => {
                    let i = i % heap.len();
                    let removed = heap.remove_at(i).unwrap().unwrap();
                    let pos = model.iter().position(|&x| x == removed).unwrap();
                    model.swap_remove(pos);
                }
                HeapOp::Set(i, x) if !model.is_empty() => {
                    let i = i % heap.len();
                    let old = heap.set(i, x).unwrap().unwrap();
                    let pos = model.iter().position(|&y| y == old).unwrap();
                    model[pos] = x;
                }
                _ => {}
            }
            prop_assert!(is_heap_ordered(&heap));
            prop_assert_eq!(heap.len(), model.len());
        }
    }

    #[test]
    fn from_vec_heapifies(items in prop::collection::vec(any::<i16>(), 0..100), polarity in arb_polarity()) {
        let heap: Heap<i16> = Heap::from_vec(items.clone(), polarity).unwrap();
        prop_assert!(is_heap_ordered(&heap));
        prop_assert_eq!(heap.len(), items.len());
    }
}

// =============================================================================
// PriorityQueue
// =============================================================================

proptest! {
    #[test]
    fn queue_drains_like_binary_heap(
        items in prop::collection::vec(any::<i64>(), 0..200),
        polarity in arb_polarity(),
    ) {
        let mut queue = PriorityQueue::new(polarity);
        for &x in &items {
            queue.enqueue(x).unwrap();
            prop_assert!(queue.len() <= queue.capacity());
        }

        let mut drained = Vec::with_capacity(items.len());
        while let Ok(x) = queue.dequeue() {
            drained.push(x);
        }

        let expected: Vec<i64> = match polarity {
            Polarity::Min => {
                let mut model: BinaryHeap<_> = items.iter().copied().map(Reverse).collect();
                std::iter::from_fn(|| model.pop().map(|Reverse(x)| x)).collect()
            }
            Polarity::Max => {
                let mut model: BinaryHeap<_> = items.iter().copied().collect();
                std::iter::from_fn(|| model.pop()).collect()
            }
        };
        prop_assert_eq!(drained, expected);
    }

    /// A foreign value is rejected without disturbing the queue.
    #[test]
    fn failed_enqueue_is_atomic(
        ops in prop::collection::vec(prop::option::of(any::<i64>()), 1..100),
        seed in any::<i64>(),
    ) {
        let mut queue = PriorityQueue::new(Polarity::Min);
        queue.enqueue(DynValue::new(seed)).unwrap();
        let mut model = vec![seed];

        for op in ops {
            let before: Vec<i64> = queue
                .iter()
                .map(|v| *v.downcast_ref::<i64>().unwrap())
                .collect();
            match op {
                Some(x) => {
                    queue.enqueue(DynValue::new(x)).unwrap();
                    model.push(x);
                }
                None => {
                    let err = queue.enqueue(DynValue::new(String::from("x"))).unwrap_err();
                    let is_mismatch =
                        matches!(err, Error::Compare(CompareError::TypeMismatch { .. }));
                    prop_assert!(is_mismatch);
                    let after: Vec<i64> = queue
                        .iter()
                        .map(|v| *v.downcast_ref::<i64>().unwrap())
                        .collect();
                    prop_assert_eq!(before, after);
                }
            }
            prop_assert!(!queue.is_poisoned());
        }

        model.sort_unstable();
        for expected in model {
            let top = queue.dequeue().unwrap();
            prop_assert_eq!(top.downcast_ref::<i64>(), Some(&expected));
        }
    }
}

// =============================================================================
// IndexedPriorityQueue
// =============================================================================

#[derive(Debug, Clone)]
enum IndexedOp {
    Enqueue(usize),
    Update(usize, i32),
    Remove(usize),
    Dequeue,
}

const POOL: usize = 32;

fn arb_indexed_op() -> impl Strategy<Value = IndexedOp> {
    prop_oneof![
        3 => (0..POOL).prop_map(IndexedOp::Enqueue),
        3 => (0..POOL, any::<i32>()).prop_map(|(h, x)| IndexedOp::Update(h, x)),
        1 => (0..POOL).prop_map(IndexedOp::Remove),
        1 => Just(IndexedOp::Dequeue),
    ]
}

proptest! {
    #[test]
    fn indexed_slots_stay_consistent(
        ops in prop::collection::vec(arb_indexed_op(), 0..300),
        polarity in arb_polarity(),
    ) {
        let mut queue = IndexedPriorityQueue::new(polarity);
        let pool: Vec<_> = (0..POOL as i32).map(Handle::new).collect();

        for op in ops {
            match op {
                IndexedOp::Enqueue(h) => {
                    let handle = &pool[h];
                    let was_queued = handle.is_queued();
                    let res = queue.enqueue(handle.clone());
                    prop_assert_eq!(res.is_err(), was_queued);
                    prop_assert!(handle.is_queued());
                }
                IndexedOp::Update(h, x) => {
                    let handle = &pool[h];
                    let before = handle.get();
                    match queue.update(handle, x) {
                        Ok(previous) => prop_assert_eq!(previous, before),
                        Err(err) => {
                            prop_assert_eq!(err, Error::NotInQueue);
                            prop_assert!(!handle.is_queued());
                        }
                    }
                }
                IndexedOp::Remove(h) => {
                    let handle = &pool[h];
                    let was_queued = handle.is_queued();
                    prop_assert_eq!(queue.remove(handle).is_ok(), was_queued);
                    prop_assert!(!handle.is_queued());
                }
                IndexedOp::Dequeue => {
                    let expected = queue.iter().map(|h| h.get()).reduce(|a, b| match polarity {
                        Polarity::Min => a.min(b),
                        Polarity::Max => a.max(b),
                    });
                    match queue.dequeue() {
                        Ok(h) => {
                            prop_assert_eq!(Some(h.get()), expected);
                            prop_assert_eq!(h.slot(), None);
                        }
                        Err(err) => {
                            prop_assert_eq!(err, Error::Empty);
                            prop_assert_eq!(expected, None);
                        }
                    }
                }
            }

            for (slot, handle) in queue.iter().enumerate() {
                prop_assert_eq!(handle.slot(), Some(slot));
            }
            let queued = pool.iter().filter(|h| h.is_queued()).count();
            prop_assert_eq!(queued, queue.len());
        }
    }
}

// =============================================================================
// TopKBuffer
// =============================================================================

proptest! {
    #[test]
    fn top_k_keeps_largest(
        items in prop::collection::vec(any::<i32>(), 0..200),
        k in 1usize..20,
    ) {
        let mut top = TopKBuffer::new(k).unwrap();
        for &x in &items {
            top.add(x).unwrap();
            prop_assert!(top.len() <= k);
        }

        let mut expected = items;
        expected.sort_unstable_by(|a, b| b.cmp(a));
        expected.truncate(k);
        prop_assert_eq!(top.flush().unwrap(), expected);
        prop_assert!(top.is_empty());
    }

    #[test]
    fn reset_k_evicts_smallest_ascending(
        items in prop::collection::vec(any::<i32>(), 0..100),
        k in 1usize..20,
        new_k in 1usize..20,
    ) {
        let mut top = TopKBuffer::new(k).unwrap();
        for &x in &items {
            top.add(x).unwrap();
        }

        let mut retained = items;
        retained.sort_unstable_by(|a, b| b.cmp(a));
        retained.truncate(k);

        let evicted = top.reset_k(new_k).unwrap();
        let keep = retained.len().min(new_k);
        let mut expected_evicted = retained.split_off(keep);
        expected_evicted.reverse();

        prop_assert_eq!(evicted, expected_evicted);
        prop_assert_eq!(top.k(), new_k);
        prop_assert_eq!(top.flush().unwrap(), retained);
    }
}
