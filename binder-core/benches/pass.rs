//! Reconciliation pass benchmarks.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use binder_core::{Binder, ManualFrames};

fn populated(count: usize, source: &Arc<AtomicI32>) -> Binder {
    let binder = Binder::new(ManualFrames::new());
    for _ in 0..count {
        let source = source.clone();
        binder.bind(move || source.load(Ordering::Relaxed), |v: &i32| {
            black_box(*v);
        });
    }
    // First observation
    binder.run_pass().ok();
    binder
}

fn bench_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("pass");

    for count in [100, 1_000, 10_000] {
        let source = Arc::new(AtomicI32::new(0));
        let binder = populated(count, &source);

        group.bench_with_input(BenchmarkId::new("unchanged", count), &binder, |b, binder| {
            b.iter(|| binder.run_pass())
        });

        group.bench_with_input(BenchmarkId::new("changed", count), &binder, |b, binder| {
            b.iter(|| {
                source.fetch_add(1, Ordering::Relaxed);
                binder.run_pass()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pass);
criterion_main!(benches);
