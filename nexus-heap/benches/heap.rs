//! Benchmarks for the heap containers, with std's BinaryHeap as baseline.
//!
//! Run with: cargo bench
//!
//! Inputs are generated once from a fixed seed so every run sees the same
//! sequence.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use nexus_heap::{Handle, IndexedPriorityQueue, Polarity, PriorityQueue, QueueConfig, TopKBuffer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N: usize = 10_000;
const K: usize = 100;

fn random_input(n: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(0x6e65_7875_7368_6561);
    (0..n).map(|_| rng.r#gen()).collect()
}

// ============================================================================
// Push/Pop Benchmarks
// ============================================================================

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop");
    group.throughput(Throughput::Elements(N as u64));
    let input = random_input(N);

    let config = QueueConfig::new().capacity(N);
    let mut queue = PriorityQueue::with_config(&config).unwrap();
    group.bench_function("nexus-heap", |b| {
        b.iter(|| {
            for &x in &input {
                queue.enqueue(x).unwrap();
            }
            while let Ok(x) = queue.dequeue() {
                black_box(x);
            }
        });
    });

    let mut std_heap = BinaryHeap::with_capacity(N);
    group.bench_function("std", |b| {
        b.iter(|| {
            for &x in &input {
                std_heap.push(Reverse(x));
            }
            while let Some(x) = std_heap.pop() {
                black_box(x);
            }
        });
    });

    group.finish();
}

// ============================================================================
// Indexed Update Benchmarks
// ============================================================================

fn bench_indexed_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexed_update");
    group.throughput(Throughput::Elements(N as u64));
    let input = random_input(N);
    let updates = random_input(N);

    let mut queue = IndexedPriorityQueue::new(Polarity::Min);
    let handles: Vec<_> = input.iter().copied().map(Handle::new).collect();
    for h in &handles {
        queue.enqueue(h.clone()).unwrap();
    }

    group.bench_function("update", |b| {
        b.iter(|| {
            for (h, &x) in handles.iter().zip(&updates) {
                black_box(queue.update(h, x).unwrap());
            }
        });
    });

    group.bench_function("remove_enqueue", |b| {
        b.iter(|| {
            for h in &handles {
                queue.remove(h).unwrap();
                queue.enqueue(h.clone()).unwrap();
            }
        });
    });

    group.finish();
}

// ============================================================================
// Top-K Benchmarks
// ============================================================================

fn bench_top_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_k");
    group.throughput(Throughput::Elements(N as u64));
    let input = random_input(N);

    let mut top = TopKBuffer::new(K).unwrap();
    group.bench_function("nexus-heap", |b| {
        b.iter(|| {
            for &x in &input {
                black_box(top.add(x).unwrap());
            }
            black_box(top.flush().unwrap());
        });
    });

    let mut std_heap = BinaryHeap::with_capacity(K + 1);
    group.bench_function("std", |b| {
        b.iter(|| {
            for &x in &input {
                std_heap.push(Reverse(x));
                if std_heap.len() > K {
                    std_heap.pop();
                }
            }
            black_box(std_heap.drain().count());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_push_pop, bench_indexed_update, bench_top_k);
criterion_main!(benches);
