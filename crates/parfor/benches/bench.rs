use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use parfor::{AffinityState, Dispatcher, PartitionPlan, Range, Scheduler, Sequential};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

// Number of indices visited per benchmark iteration.
const TOTAL_ELEMS: u64 = 1 << 20;

fn sum_of_squares(chunk: Range<u64>, total: &AtomicU64) {
    let local = chunk
        .iter()
        .fold(0u64, |acc, i| acc.wrapping_add(i.wrapping_mul(i)));
    total.fetch_add(local, Ordering::Relaxed);
}

/// Benchmarks `for_each_range_with_step` across a sweep of minimum chunk
/// sizes.
fn bench_range<S: Scheduler>(c: &mut Criterion, group_name: &str, scheduler_fn: impl Fn() -> S) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_ELEMS));

    let dispatcher = Dispatcher::new(scheduler_fn());
    for min_step in [1usize, 64, 4096, 65_536] {
        group.bench_function(format!("elems/{TOTAL_ELEMS}/min_step/{min_step}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();

                for _ in 0..iters {
                    let total = AtomicU64::new(0);
                    dispatcher
                        .for_each_range_with_step(0, TOTAL_ELEMS, min_step, |chunk| {
                            sum_of_squares(chunk, &total);
                        })
                        .unwrap();
                    black_box(total.into_inner());
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Benchmarks the per-index entry points: dynamic, static and affinity.
fn bench_index<S: Scheduler>(c: &mut Criterion, group_name: &str, scheduler_fn: impl Fn() -> S) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_ELEMS));

    let dispatcher = Dispatcher::new(scheduler_fn());
    let work = |i: u64, total: &AtomicU64| {
        if i % 1024 == 0 {
            total.fetch_add(i, Ordering::Relaxed);
        }
    };

    group.bench_function(format!("elems/{TOTAL_ELEMS}/dynamic"), |b| {
        b.iter(|| {
            let total = AtomicU64::new(0);
            dispatcher
                .for_each_index(TOTAL_ELEMS, |i| work(black_box(i), &total))
                .unwrap();
            black_box(total.into_inner())
        });
    });

    group.bench_function(format!("elems/{TOTAL_ELEMS}/static"), |b| {
        b.iter(|| {
            let total = AtomicU64::new(0);
            dispatcher
                .for_each_index_static(TOTAL_ELEMS, |i| work(black_box(i), &total))
                .unwrap();
            black_box(total.into_inner())
        });
    });

    group.bench_function(format!("elems/{TOTAL_ELEMS}/affinity"), |b| {
        let mut state = AffinityState::new();
        b.iter(|| {
            let total = AtomicU64::new(0);
            dispatcher
                .for_each_index_affinity(TOTAL_ELEMS, |i| work(black_box(i), &total), &mut state)
                .unwrap();
            black_box(total.into_inner())
        });
    });

    group.finish();
}

/// Partitioning alone, without dispatch.
fn benchmark_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");

    for parallelism in [1usize, 8, 64] {
        group.bench_function(format!("plan/parallelism/{parallelism}"), |b| {
            b.iter(|| {
                let plan = PartitionPlan::new(0u64, black_box(TOTAL_ELEMS), 1, parallelism);
                plan.chunks().map(|chunk| chunk.size()).sum::<usize>()
            });
        });
    }

    group.finish();
}

fn benchmark_sequential_range(c: &mut Criterion) {
    bench_range(c, "sequential/range", || Sequential);
}

fn benchmark_sequential_index(c: &mut Criterion) {
    bench_index(c, "sequential/index", || Sequential);
}

#[cfg(feature = "threads")]
fn benchmark_threads_range(c: &mut Criterion) {
    bench_range(c, "threads/range", parfor::ThreadScheduler::new);
}

#[cfg(feature = "threads")]
fn benchmark_threads_index(c: &mut Criterion) {
    bench_index(c, "threads/index", parfor::ThreadScheduler::new);
}

#[cfg(feature = "rayon")]
fn benchmark_rayon_range(c: &mut Criterion) {
    bench_range(c, "rayon/range", parfor::RayonScheduler::global);
}

#[cfg(feature = "rayon")]
fn benchmark_rayon_index(c: &mut Criterion) {
    bench_index(c, "rayon/index", parfor::RayonScheduler::global);
}

criterion_group!(
    benches,
    benchmark_partition,
    benchmark_sequential_range,
    benchmark_sequential_index,
);

#[cfg(feature = "threads")]
criterion_group!(threads_benches, benchmark_threads_range, benchmark_threads_index);

#[cfg(feature = "rayon")]
criterion_group!(rayon_benches, benchmark_rayon_range, benchmark_rayon_index);

#[cfg(all(feature = "threads", feature = "rayon"))]
criterion_main!(benches, threads_benches, rayon_benches);
#[cfg(all(feature = "threads", not(feature = "rayon")))]
criterion_main!(benches, threads_benches);
#[cfg(all(not(feature = "threads"), feature = "rayon"))]
criterion_main!(benches, rayon_benches);
#[cfg(not(any(feature = "threads", feature = "rayon")))]
criterion_main!(benches);
