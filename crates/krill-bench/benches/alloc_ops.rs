//! Criterion micro-benchmarks for the TLSF and arena allocators.
//!
//! Baseline focus:
//! - TLSF allocate/deallocate churn at varying block sizes
//! - arena bump throughput and reset-reuse cycles

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use krill_alloc::{AllocConfig, Arena, Tlsf};

fn bench_tlsf(c: &mut Criterion) {
    let mut group = c.benchmark_group("tlsf");
    for &size in &[64u32, 256, 1024] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("alloc_free_pair", size),
            &size,
            |b, &size| {
                let mut tlsf = Tlsf::new(vec![0; 1 << 20]);
                b.iter(|| {
                    let p = tlsf.allocate(size).expect("engine has room");
                    tlsf.deallocate(p)
                });
            },
        );
    }

    group.bench_function("churn_64_blocks", |b| {
        let mut tlsf = Tlsf::new(vec![0; 1 << 20]);
        b.iter(|| {
            let blocks: Vec<u32> = (0..64)
                .map(|i| tlsf.allocate(64 + i * 16).expect("engine has room"))
                .collect();
            // Free in interleaved order to exercise coalescing.
            for p in blocks.iter().step_by(2) {
                tlsf.deallocate(*p);
            }
            for p in blocks.iter().skip(1).step_by(2) {
                tlsf.deallocate(*p);
            }
        });
    });
    group.finish();
}

fn bench_arena(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena");
    group.throughput(Throughput::Elements(1024));

    group.bench_function("bump_1024_allocations", |b| {
        let config = AllocConfig {
            block_size: 64 * 1024,
            ..AllocConfig::default()
        };
        b.iter(|| {
            let mut arena = Arena::with_config(&config);
            for _ in 0..1024 {
                arena.allocate(32).expect("growable arena never fails");
            }
            arena.block_count()
        });
    });

    group.bench_function("reset_reuse_cycle", |b| {
        let config = AllocConfig {
            block_size: 64 * 1024,
            ..AllocConfig::default()
        };
        let mut arena = Arena::with_config(&config);
        b.iter(|| {
            for _ in 0..1024 {
                arena.allocate(32).expect("growable arena never fails");
            }
            arena.reset();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_tlsf, bench_arena);
criterion_main!(benches);
