//! # Lock Benchmark
//!
//! Measures the cost of the guard round-trip on each path:
//! - uncontended read and write cycles on both APIs
//! - read-heavy and write-heavy mixes across threads
//!
//! Run with: `cargo bench --package turnstile_core`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use std::sync::{Arc, Barrier};
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use turnstile_core::{PriorityRwLock, RawRwLock};

/// Operations each thread performs per iteration of the contended benches.
const OPS_PER_THREAD: usize = 1_000;

/// Benchmark: uncontended raw acquire/release.
fn bench_raw_uncontended(c: &mut Criterion) {
    let lock = RawRwLock::new().unwrap();

    c.bench_function("raw_read_cycle", |b| {
        b.iter(|| {
            lock.acquire_read().unwrap();
            lock.release().unwrap();
        });
    });

    c.bench_function("raw_write_cycle", |b| {
        b.iter(|| {
            lock.acquire_write().unwrap();
            lock.release().unwrap();
        });
    });
}

/// Benchmark: uncontended guarded access.
fn bench_guarded_uncontended(c: &mut Criterion) {
    let lock = PriorityRwLock::new(0u64);

    c.bench_function("guarded_read", |b| {
        b.iter(|| black_box(*lock.read()));
    });

    c.bench_function("guarded_write", |b| {
        b.iter(|| *lock.write() += 1);
    });
}

/// Runs `threads` workers; one in `write_every` operations is a write.
fn run_mix(lock: &Arc<PriorityRwLock<u64>>, threads: usize, write_every: usize) {
    let start = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let lock = Arc::clone(lock);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for i in 0..OPS_PER_THREAD {
                    if (i + t) % write_every == 0 {
                        *lock.write() += 1;
                    } else {
                        black_box(*lock.read());
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

/// Benchmark: mixed load across thread counts.
fn bench_contended_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_mix");
    group.sample_size(20);

    for threads in [2, 4, 8] {
        let lock = Arc::new(PriorityRwLock::new(0u64));

        group.bench_with_input(BenchmarkId::new("read_heavy", threads), &threads, |b, &threads| {
            b.iter(|| run_mix(&lock, threads, 50));
        });

        group.bench_with_input(BenchmarkId::new("write_heavy", threads), &threads, |b, &threads| {
            b.iter(|| run_mix(&lock, threads, 2));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_raw_uncontended,
    bench_guarded_uncontended,
    bench_contended_mix,
);
criterion_main!(benches);
