use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::runtime::Runtime;

use sparkgap::{Breaker, BreakerConfig};

fn config() -> BreakerConfig {
    BreakerConfig {
        failure_threshold: u32::MAX,
        retry_delay: Duration::from_secs(60),
        ..Default::default()
    }
}

/// Benchmark the closed-state hot path
fn bench_closed_execute(c: &mut Criterion) {
    let breaker: Breaker<u64> = Breaker::new("bench-closed", config());

    c.bench_function("execute_closed_success", |b| {
        b.iter(|| black_box(breaker.execute(|| Ok::<_, ()>(black_box(42)))))
    });

    c.bench_function("execute_closed_failure", |b| {
        b.iter(|| black_box(breaker.execute(|| Err::<u64, _>(black_box(())))))
    });
}

/// Benchmark the short-circuit path
fn bench_open_execute(c: &mut Criterion) {
    let breaker: Breaker<u64> = Breaker::new("bench-open", config());
    breaker.trip();

    c.bench_function("execute_open_short_circuit", |b| {
        b.iter(|| black_box(breaker.execute(|| Ok::<_, ()>(1))))
    });
}

/// Benchmark async execution on a tokio runtime
fn bench_async_execute(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let breaker: Breaker<u64> = Breaker::new("bench-async", config());

    c.bench_function("execute_async_closed_success", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(breaker.execute_async(async { Ok::<_, ()>(7) }).await) })
    });
}

/// Benchmark contention from many threads sharing one breaker
fn bench_contended_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_execute");
    group.significance_level(0.1).sample_size(10);

    for threads in [2usize, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, &threads| {
            let breaker: Arc<Breaker<u64>> = Arc::new(Breaker::new("bench-contended", config()));
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let breaker = Arc::clone(&breaker);
                        thread::spawn(move || {
                            for i in 0..1_000u64 {
                                let _ = black_box(breaker.execute(|| {
                                    if i % 10 == 0 {
                                        Err(())
                                    } else {
                                        Ok(i)
                                    }
                                }));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_closed_execute,
    bench_open_execute,
    bench_async_execute,
    bench_contended_execute
);
criterion_main!(benches);
