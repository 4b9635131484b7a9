//! Krill quickstart — a complete tour of the runtime in one driver.
//!
//! Demonstrates:
//!   1. Populating a registry with a mixed component layout
//!   2. Single-pool `each` passes
//!   3. A two-pool view with per-entity joins
//!   4. A group with stride-1 prefix iteration
//!   5. A job DAG plus a parallel-for over an index range
//!   6. Backing transient workloads with the TLSF and arena allocators
//!
//! Run with:
//!   cargo run --example quickstart

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use krill::prelude::*;

const ENTITY_COUNT: usize = 100_000;

#[derive(Debug, Clone, Copy)]
struct Mass {
    value: i32,
}

#[derive(Debug, Clone, Copy)]
struct Charge {
    value: f64,
}

#[derive(Debug, Clone, Copy)]
struct Tag {
    value: u8,
}

fn main() {
    // ── 1. Populate ─────────────────────────────────────────────
    //
    // Every entity carries Mass; odd entities carry Charge, even ones
    // carry Tag.
    let start = Instant::now();
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..ENTITY_COUNT).map(|_| registry.create()).collect();
    for (i, &e) in entities.iter().enumerate() {
        registry.add(e, Mass { value: 1 });
        if i % 2 == 1 {
            registry.add(e, Charge { value: 0.3 });
        } else {
            registry.add(e, Tag { value: b'a' });
        }
    }
    println!(
        "populated {ENTITY_COUNT} entities in {:.2?} ({} Mass, {} Charge, {} Tag)",
        start.elapsed(),
        registry.count::<Mass>(),
        registry.count::<Charge>(),
        registry.count::<Tag>(),
    );

    // ── 2. Single-pool passes ───────────────────────────────────
    let start = Instant::now();
    registry.each::<Mass>(|m| m.value += 1);
    registry.each::<Charge>(|c| c.value += 2.0);
    registry.each::<Tag>(|t| t.value += 1);
    println!("three each() passes in {:.2?}", start.elapsed());

    // ── 3. View join ────────────────────────────────────────────
    //
    // Every even entity accumulates its tag into its mass.
    let start = Instant::now();
    let mut visited = 0usize;
    registry.view::<(Mass, Tag)>().each(|m, t| {
        m.value += t.value as i32;
        visited += 1;
    });
    println!("view over (Mass, Tag) visited {visited} entities in {:.2?}", start.elapsed());
    assert_eq!(visited, ENTITY_COUNT / 2);

    // ── 4. Group ────────────────────────────────────────────────
    //
    // Mass+Charge becomes a hot path: group them for conditional-free
    // iteration over the shared prefix.
    let group = registry
        .group::<(Mass, Charge)>()
        .expect("no other group owns these types");
    let start = Instant::now();
    let mut energy = 0.0f64;
    registry.group_view::<(Mass, Charge)>(&group).each(|m, c| {
        energy += m.value as f64 * c.value;
    });
    println!(
        "group over {} members accumulated energy {energy:.1} in {:.2?}",
        registry.group_len(&group),
        start.elapsed()
    );
    registry.drop_group(group);

    // ── 5. Jobs ─────────────────────────────────────────────────
    let mut pool = ThreadPool::new(Some(4));
    let sum = Arc::new(AtomicU64::new(0));

    // A small DAG: two producers feed a combiner.
    let produced = Arc::new(AtomicU64::new(0));
    let left = {
        let produced = Arc::clone(&produced);
        pool.create_job(move || {
            produced.fetch_add(21, Ordering::Relaxed);
        })
    };
    let right = {
        let produced = Arc::clone(&produced);
        pool.create_job(move || {
            produced.fetch_add(21, Ordering::Relaxed);
        })
    };
    let combine = {
        let produced = Arc::clone(&produced);
        let sum = Arc::clone(&sum);
        pool.create_job(move || {
            sum.store(produced.load(Ordering::Relaxed), Ordering::Relaxed);
        })
    };
    pool.add_child(left, combine);
    pool.add_child(right, combine);
    pool.submit_job(left);
    pool.submit_job(right);
    pool.wait();
    println!("job DAG combined {}", sum.load(Ordering::Relaxed));

    // Parallel-for over an index range, one chunk per worker.
    let start = Instant::now();
    let total = Arc::new(AtomicU64::new(0));
    {
        let total = Arc::clone(&total);
        parallel_for(&pool, 0, ENTITY_COUNT, move |i| {
            total.fetch_add(i as u64, Ordering::Relaxed);
        });
    }
    println!(
        "parallel_for summed 0..{ENTITY_COUNT} = {} in {:.2?}",
        total.load(Ordering::Relaxed),
        start.elapsed()
    );
    pool.stop();

    // ── 6. Allocators ───────────────────────────────────────────
    let mut tlsf = Tlsf::new(vec![0; 1 << 20]);
    let a = tlsf.allocate(256).expect("fresh engine serves 256 bytes");
    let b = tlsf.allocate(256).expect("fresh engine serves 256 bytes");
    tlsf.deallocate(a);
    tlsf.deallocate(b);
    let merged = tlsf.allocate(512).expect("coalesced neighbours serve 512");
    println!("tlsf coalesced two 256-byte frees into a 512-byte block at offset {merged}");

    let mut arena = Arena::new();
    let first = arena.allocate(1024).expect("growable arena never fails");
    arena.reset();
    let again = arena.allocate(1024).expect("growable arena never fails");
    assert_eq!(first, again, "reset reuses the same addresses");
    println!(
        "arena reused block {} offset {} after reset",
        again.block, again.offset
    );
}
