use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sommatori::adders::long_adder::LongAdder;

const NUM_THREADS: usize = 8;
const ITERATIONS_PER_THREAD: usize = 1_000_000;

fn bench_long_adder(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter_increment");

    group.bench_function(
        BenchmarkId::new(
            "LongAdder (striped)",
            format!("{}threads x {}iter", NUM_THREADS, ITERATIONS_PER_THREAD),
        ),
        |b| {
            b.iter(|| {
                let counter = Arc::new(LongAdder::new());
                let mut handles = vec![];

                for _ in 0..NUM_THREADS {
                    let counter_clone = Arc::clone(&counter);
                    handles.push(thread::spawn(move || {
                        for _ in 0..ITERATIONS_PER_THREAD {
                            counter_clone.increment();
                        }
                    }));
                }

                for handle in handles {
                    handle.join().unwrap();
                }

                black_box(counter.sum())
            })
        },
    );

    group.bench_function(
        BenchmarkId::new(
            "AtomicI64 (single)",
            format!("{}threads x {}iter", NUM_THREADS, ITERATIONS_PER_THREAD),
        ),
        |b| {
            b.iter(|| {
                let counter = Arc::new(AtomicI64::new(0));
                let mut handles = vec![];

                for _ in 0..NUM_THREADS {
                    let counter_clone = Arc::clone(&counter);
                    handles.push(thread::spawn(move || {
                        for _ in 0..ITERATIONS_PER_THREAD {
                            counter_clone.fetch_add(1, Ordering::Relaxed);
                        }
                    }));
                }

                for handle in handles {
                    handle.join().unwrap();
                }

                black_box(counter.load(Ordering::Relaxed))
            })
        },
    );

    group.finish();
}

criterion_group!(benches, bench_long_adder);
criterion_main!(benches);
