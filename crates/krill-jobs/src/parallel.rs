//! Parallel-for helpers over a [`ThreadPool`].
//!
//! Each helper partitions an index range into one chunk per worker
//! (remainder spread over the leading chunks), submits one job per
//! non-empty chunk, and waits for the whole range before returning. The
//! 2-D variants partition the longer axis across workers and iterate the
//! shorter axis inside each job.
//!
//! Callables are shared across workers via `Arc`, so they must be
//! `Fn + Send + Sync + 'static`. State that the range mutates is shared
//! the same way — atomics, or per-chunk partitions handed out through
//! the chunk variants. The registry itself is not thread-safe; parallel
//! callers iterate over partitioned data, not over live pools.
//!
//! Do not call these from inside a job running on the same pool: they
//! wait on it, which is the observable-deadlock case [`ThreadPool::wait`]
//! debug-panics on.

use std::sync::Arc;

use crate::pool::ThreadPool;

/// Chunk bounds for worker `i` of `workers` over a `range`-sized span:
/// `range / workers` each, remainder spread over the leading chunks.
fn chunk_bounds(range: usize, workers: usize, i: usize) -> (usize, usize) {
    let base = range / workers;
    let remainder = range % workers;
    let extra = i.min(remainder);
    let start = i * base + extra;
    let len = base + usize::from(i < remainder);
    (start, start + len)
}

/// Invoke `f` once per index in `[start, end)`, spread across the pool.
///
/// Blocks until the whole range has been processed.
///
/// # Panics
///
/// Panics if `end < start`.
pub fn parallel_for<F>(pool: &ThreadPool, start: usize, end: usize, f: F)
where
    F: Fn(usize) + Send + Sync + 'static,
{
    assert!(end >= start, "inverted range {start}..{end}");
    let workers = pool.thread_count();
    let range = end - start;
    let f = Arc::new(f);

    for i in 0..workers {
        let (chunk_start, chunk_end) = chunk_bounds(range, workers, i);
        if chunk_start == chunk_end {
            break;
        }
        let f = Arc::clone(&f);
        let (lo, hi) = (start + chunk_start, start + chunk_end);
        pool.submit(move || {
            for index in lo..hi {
                f(index);
            }
        });
    }
    pool.wait();
}

/// Invoke `f(chunk_start, chunk_end)` once per non-empty chunk of
/// `[start, end)`; the callable iterates its chunk itself.
///
/// # Panics
///
/// Panics if `end < start`.
pub fn parallel_for_chunk<F>(pool: &ThreadPool, start: usize, end: usize, f: F)
where
    F: Fn(usize, usize) + Send + Sync + 'static,
{
    assert!(end >= start, "inverted range {start}..{end}");
    let workers = pool.thread_count();
    let range = end - start;
    let f = Arc::new(f);

    for i in 0..workers {
        let (chunk_start, chunk_end) = chunk_bounds(range, workers, i);
        if chunk_start == chunk_end {
            break;
        }
        let f = Arc::clone(&f);
        let (lo, hi) = (start + chunk_start, start + chunk_end);
        pool.submit(move || f(lo, hi));
    }
    pool.wait();
}

/// Invoke `f(x, y)` once per cell of the rectangle
/// `[start.0, end.0) × [start.1, end.1)`.
///
/// The longer axis is partitioned across workers; the shorter axis is
/// iterated inside each job.
///
/// # Panics
///
/// Panics if the rectangle is inverted on either axis.
pub fn parallel_for_2d<F>(pool: &ThreadPool, start: (usize, usize), end: (usize, usize), f: F)
where
    F: Fn(usize, usize) + Send + Sync + 'static,
{
    assert!(
        end.0 >= start.0 && end.1 >= start.1,
        "inverted rectangle {start:?}..{end:?}"
    );
    let workers = pool.thread_count();
    let range_x = end.0 - start.0;
    let range_y = end.1 - start.1;
    let f = Arc::new(f);

    if range_x >= range_y {
        for i in 0..workers {
            let (lo, hi) = chunk_bounds(range_x, workers, i);
            if lo == hi {
                break;
            }
            let f = Arc::clone(&f);
            let (x0, x1) = (start.0 + lo, start.0 + hi);
            let (y0, y1) = (start.1, end.1);
            pool.submit(move || {
                for x in x0..x1 {
                    for y in y0..y1 {
                        f(x, y);
                    }
                }
            });
        }
    } else {
        for i in 0..workers {
            let (lo, hi) = chunk_bounds(range_y, workers, i);
            if lo == hi {
                break;
            }
            let f = Arc::clone(&f);
            let (y0, y1) = (start.1 + lo, start.1 + hi);
            let (x0, x1) = (start.0, end.0);
            pool.submit(move || {
                for y in y0..y1 {
                    for x in x0..x1 {
                        f(x, y);
                    }
                }
            });
        }
    }
    pool.wait();
}

/// Invoke `f(chunk_start, chunk_end)` once per rectangular chunk, where
/// the chunks tile `[start.0, end.0) × [start.1, end.1)` along the
/// longer axis.
///
/// # Panics
///
/// Panics if the rectangle is inverted on either axis.
pub fn parallel_for_2d_chunk<F>(
    pool: &ThreadPool,
    start: (usize, usize),
    end: (usize, usize),
    f: F,
) where
    F: Fn((usize, usize), (usize, usize)) + Send + Sync + 'static,
{
    assert!(
        end.0 >= start.0 && end.1 >= start.1,
        "inverted rectangle {start:?}..{end:?}"
    );
    let workers = pool.thread_count();
    let range_x = end.0 - start.0;
    let range_y = end.1 - start.1;
    let f = Arc::new(f);

    if range_x >= range_y {
        for i in 0..workers {
            let (lo, hi) = chunk_bounds(range_x, workers, i);
            if lo == hi {
                break;
            }
            let f = Arc::clone(&f);
            let (x0, x1) = (start.0 + lo, start.0 + hi);
            let (y0, y1) = (start.1, end.1);
            pool.submit(move || f((x0, y0), (x1, y1)));
        }
    } else {
        for i in 0..workers {
            let (lo, hi) = chunk_bounds(range_y, workers, i);
            if lo == hi {
                break;
            }
            let f = Arc::clone(&f);
            let (y0, y1) = (start.1 + lo, start.1 + hi);
            let (x0, x1) = (start.0, end.0);
            pool.submit(move || f((x0, y0), (x1, y1)));
        }
    }
    pool.wait();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    fn visit_counts(n: usize) -> Arc<Vec<AtomicU32>> {
        Arc::new((0..n).map(|_| AtomicU32::new(0)).collect())
    }

    #[test]
    fn chunk_bounds_tile_the_range() {
        for &(range, workers) in &[(10usize, 3usize), (7, 8), (100, 4), (0, 2), (5, 5)] {
            let mut covered = 0;
            let mut expected_start = 0;
            for i in 0..workers {
                let (s, e) = chunk_bounds(range, workers, i);
                assert_eq!(s, expected_start, "chunks are contiguous");
                assert!(e >= s);
                covered += e - s;
                expected_start = e;
            }
            assert_eq!(covered, range, "chunks cover {range} over {workers} workers");
        }
    }

    #[test]
    fn every_index_visited_exactly_once() {
        let mut pool = ThreadPool::new(Some(4));
        let counts = visit_counts(1000);
        {
            let counts = Arc::clone(&counts);
            parallel_for(&pool, 0, 1000, move |i| {
                counts[i].fetch_add(1, Ordering::Relaxed);
            });
        }
        assert!(counts.iter().all(|c| c.load(Ordering::Relaxed) == 1));
        pool.stop();
    }

    #[test]
    fn nonzero_start_offsets_are_respected() {
        let mut pool = ThreadPool::new(Some(3));
        let sum = Arc::new(AtomicUsize::new(0));
        {
            let sum = Arc::clone(&sum);
            parallel_for(&pool, 10, 20, move |i| {
                sum.fetch_add(i, Ordering::Relaxed);
            });
        }
        assert_eq!(sum.load(Ordering::Relaxed), (10..20).sum());
        pool.stop();
    }

    #[test]
    fn empty_range_submits_nothing() {
        let mut pool = ThreadPool::new(Some(2));
        let touched = Arc::new(AtomicU32::new(0));
        {
            let touched = Arc::clone(&touched);
            parallel_for(&pool, 5, 5, move |_| {
                touched.fetch_add(1, Ordering::Relaxed);
            });
        }
        assert_eq!(touched.load(Ordering::Relaxed), 0);
        pool.stop();
    }

    #[test]
    fn chunk_variant_covers_range_without_overlap() {
        let mut pool = ThreadPool::new(Some(4));
        let counts = visit_counts(103); // prime-ish size exercises the remainder
        {
            let counts = Arc::clone(&counts);
            parallel_for_chunk(&pool, 0, 103, move |lo, hi| {
                for i in lo..hi {
                    counts[i].fetch_add(1, Ordering::Relaxed);
                }
            });
        }
        assert!(counts.iter().all(|c| c.load(Ordering::Relaxed) == 1));
        pool.stop();
    }

    #[test]
    fn two_d_visits_every_cell_once_landscape_and_portrait() {
        let mut pool = ThreadPool::new(Some(4));
        for &(w, h) in &[(20usize, 3usize), (3, 20)] {
            let counts = visit_counts(w * h);
            {
                let counts = Arc::clone(&counts);
                parallel_for_2d(&pool, (0, 0), (w, h), move |x, y| {
                    counts[y * w + x].fetch_add(1, Ordering::Relaxed);
                });
            }
            assert!(
                counts.iter().all(|c| c.load(Ordering::Relaxed) == 1),
                "{w}x{h} rectangle fully covered exactly once"
            );
        }
        pool.stop();
    }

    #[test]
    fn two_d_chunk_tiles_the_rectangle() {
        let mut pool = ThreadPool::new(Some(3));
        let counts = visit_counts(17 * 5);
        {
            let counts = Arc::clone(&counts);
            parallel_for_2d_chunk(&pool, (0, 0), (17, 5), move |lo, hi| {
                for x in lo.0..hi.0 {
                    for y in lo.1..hi.1 {
                        counts[y * 17 + x].fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
        assert!(counts.iter().all(|c| c.load(Ordering::Relaxed) == 1));
        pool.stop();
    }
}
