//! Benchmarks for the event queue backends.
//!
//! Covers a bulk fill and drain, the self-rescheduling timer loop that
//! dominates simulator workloads, and batches of events sharing one delay.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tqueue::{Backend, RedBlackTree, SplayTree, TQueue, TwoTreeSplay, WeightBalancedTree};

const FILL: usize = 10_000;
const TIMERS: usize = 1_000;
const STEPS: usize = 10_000;

fn uniform_times(n: usize) -> Vec<f64> {
    let mut rng = SmallRng::seed_from_u64(42);
    (0..n).map(|_| rng.random_range(0.0..1000.0)).collect()
}

// ============================================================================
// Fill then drain
// ============================================================================

fn fill_drain<B: Backend>(c: &mut Criterion) {
    let times = uniform_times(FILL);
    let mut group = c.benchmark_group("fill_drain");
    group.throughput(Throughput::Elements(FILL as u64));

    group.bench_function(B::NAME, |b| {
        let mut q: TQueue<u32, B> = TQueue::with_capacity(FILL);
        b.iter(|| {
            for (i, &t) in times.iter().enumerate() {
                q.insert(t, i as u32);
            }
            while let Some(entry) = q.pop() {
                black_box(entry);
            }
        });
    });

    group.finish();
}

// ============================================================================
// Self-rescheduling timers
// ============================================================================

fn timers<B: Backend>(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(7);
    let periods: Vec<f64> = (0..TIMERS).map(|_| rng.random_range(0.1..5.0)).collect();

    let mut group = c.benchmark_group("move_least");
    group.throughput(Throughput::Elements(STEPS as u64));

    group.bench_function(B::NAME, |b| {
        let mut q: TQueue<u32, B> = TQueue::with_capacity(TIMERS);
        for (i, &p) in periods.iter().enumerate() {
            q.insert(p, i as u32);
        }
        b.iter(|| {
            for _ in 0..STEPS {
                let Some(item) = q.least() else { break };
                let next = q.time(item) + periods[*q.payload(item) as usize];
                q.move_least(black_box(next));
            }
        });
    });

    group.finish();
}

// ============================================================================
// Shared-delay batches
// ============================================================================

fn fifo_batches<B: Backend>(c: &mut Criterion) {
    const DELAY: f64 = 1.5;
    // Independently timed events far in the future, never drained.
    let background: Vec<f64> = uniform_times(TIMERS).iter().map(|t| t + 1e6).collect();

    let mut group = c.benchmark_group("fifo_batches");
    group.throughput(Throughput::Elements(FILL as u64));

    group.bench_function(B::NAME, |b| {
        let mut q: TQueue<u32, B> = TQueue::with_capacity(FILL + TIMERS);
        for (i, &t) in background.iter().enumerate() {
            q.insert(t, i as u32);
        }
        b.iter(|| {
            let mut now = 0.0;
            for i in 0..FILL {
                if i % 100 == 0 {
                    now += 0.01;
                }
                black_box(q.insert_fifo(now + DELAY, i as u32));
            }
            for _ in 0..FILL {
                black_box(q.pop());
            }
        });
    });

    group.finish();
}

fn all_backends(c: &mut Criterion) {
    fill_drain::<SplayTree>(c);
    fill_drain::<TwoTreeSplay>(c);
    fill_drain::<RedBlackTree>(c);
    fill_drain::<WeightBalancedTree>(c);

    timers::<SplayTree>(c);
    timers::<TwoTreeSplay>(c);
    timers::<RedBlackTree>(c);
    timers::<WeightBalancedTree>(c);

    fifo_batches::<SplayTree>(c);
    fifo_batches::<TwoTreeSplay>(c);
    fifo_batches::<RedBlackTree>(c);
    fifo_batches::<WeightBalancedTree>(c);
}

criterion_group!(benches, all_backends);
criterion_main!(benches);
