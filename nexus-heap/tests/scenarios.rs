use nexus_heap::{
    CompareError, DynValue, Error, Handle, IndexedPriorityQueue, Polarity, PriorityQueue,
    QueueConfig, TopKBuffer,
};

const INPUT: [i32; 7] = [3, 0, 9, -4, 3, -5, 8];

// =============================================================================
// PriorityQueue
// =============================================================================

#[test]
fn min_queue_dequeues_ascending() {
    let mut queue = PriorityQueue::with_config(&QueueConfig::new().capacity(7)).unwrap();
    for x in INPUT {
        queue.enqueue(x).unwrap();
    }
    assert!(queue.len() <= queue.capacity());

    let mut out = Vec::new();
    while let Ok(x) = queue.dequeue() {
        out.push(x);
    }
    assert_eq!(out, vec![-5, -4, 0, 3, 3, 8, 9]);
}

#[test]
fn dyn_queue_rejects_foreign_type() {
    let mut queue = PriorityQueue::with_config(&QueueConfig::new().capacity(5).max()).unwrap();
    for x in INPUT {
        queue.enqueue(DynValue::new(x)).unwrap();
    }
    let n = queue.len();

    let err = queue.enqueue(DynValue::new(1.2f32)).unwrap_err();
    // The resident parent is the receiver of the failing comparison.
    assert_eq!(
        err,
        Error::Compare(CompareError::TypeMismatch {
            left: "i32",
            right: "f32",
        })
    );
    assert_eq!(queue.len(), n);

    let top = queue.dequeue().unwrap();
    assert_eq!(top.downcast_ref::<i32>(), Some(&9));

    assert_eq!(
        queue.reset(usize::MAX),
        Err(Error::InvalidCapacity {
            requested: usize::MAX
        })
    );
    assert!(!queue.is_empty());

    queue.reset(4).unwrap();
    assert_eq!(queue.capacity(), 4);
    queue.clear();
    assert_eq!(queue.capacity(), 0);
    assert_eq!(queue.dequeue().unwrap_err(), Error::Empty);
    queue.enqueue(top).unwrap();
}

// =============================================================================
// IndexedPriorityQueue
// =============================================================================

#[test]
fn indexed_queue_walkthrough() {
    let config = QueueConfig::new().capacity(5).max();
    let mut queue = IndexedPriorityQueue::with_config(&config).unwrap();
    assert_eq!(queue.capacity(), 5);

    let handles: Vec<_> = INPUT.into_iter().map(Handle::new).collect();
    for h in &handles {
        queue.enqueue(h.clone()).unwrap();
    }
    let n = queue.len();

    let extra = Handle::new(-100);
    queue.enqueue(extra.clone()).unwrap();
    queue.remove(&extra).unwrap();
    assert!(!extra.is_queued());
    assert_eq!(queue.len(), n);

    let top = queue.peek().unwrap().clone();
    assert_eq!(top.slot(), Some(0));
    queue.update(&top, -2).unwrap();
    let slot = top.slot().unwrap();
    assert_ne!(slot, 0, "updated item did not move");

    let stranger = Handle::new(-2);
    assert_eq!(queue.update(&stranger, -2), Err(Error::NotInQueue));
    assert_eq!(queue.len(), n);

    let first = queue.dequeue().unwrap();
    assert_eq!(first.get(), 8);
    assert_eq!(first.slot(), None);

    queue.remove(&top).unwrap();
    assert_eq!(queue.remove(&first), Err(Error::NotInQueue));

    queue.reset(4).unwrap();
    assert_eq!(queue.capacity(), 4);
    queue.clear();
    assert_eq!(queue.capacity(), 0);
    assert_eq!(queue.dequeue().unwrap_err(), Error::Empty);

    queue.enqueue(top.clone()).unwrap();
    assert_eq!(top.slot(), Some(0));
}

#[test]
fn handles_track_slots_through_churn() {
    let mut queue = IndexedPriorityQueue::new(Polarity::Min);
    let handles: Vec<_> = (0..64).map(|i| Handle::new((i * 37) % 64)).collect();
    for h in &handles {
        queue.enqueue(h.clone()).unwrap();
    }
    for (i, h) in handles.iter().enumerate() {
        match i % 3 {
            0 => queue.update(h, 100 - i as i32).map(|_| ()).unwrap(),
            1 => queue.remove(h).unwrap(),
            _ => {}
        }
        for (slot, resident) in queue.iter().enumerate() {
            assert_eq!(resident.slot(), Some(slot));
        }
    }

    let mut last = i32::MIN;
    while let Ok(h) = queue.dequeue() {
        let v = h.get();
        assert!(v >= last);
        last = v;
    }
}

// =============================================================================
// TopKBuffer
// =============================================================================

#[test]
fn top_k_walkthrough() {
    assert_eq!(TopKBuffer::<i32>::new(0).unwrap_err(), Error::ZeroK);

    let mut top = TopKBuffer::new(3).unwrap();
    for x in INPUT {
        top.add(x).unwrap();
    }
    assert_eq!(top.len(), 3);
    assert_eq!(top.flush().unwrap(), vec![9, 8, 3]);

    for x in INPUT {
        top.add(x).unwrap();
    }
    let evicted = top.reset_k(1).unwrap();
    assert_eq!(evicted, vec![3, 8]);
    assert_eq!(top.flush().unwrap(), vec![9]);
}
