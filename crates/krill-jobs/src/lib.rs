//! Worker-pool job system for the Krill ECS runtime.
//!
//! A [`ThreadPool`] owns a fixed set of worker threads and a slab of
//! jobs. Independent callables go in through [`ThreadPool::submit`];
//! dependency DAGs are built with [`ThreadPool::create_job`] /
//! [`ThreadPool::add_child`] and released with
//! [`ThreadPool::submit_job`] — a child starts only after every parent
//! has returned.
//!
//! The [`parallel_for`] family splits 1-D and 2-D index ranges into one
//! chunk per worker and blocks until the whole range is processed.
//!
//! Jobs run to completion on one thread; there is no cooperative
//! yielding and no in-job cancellation. A panicking callable aborts the
//! process — worker threads are never silently destroyed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod parallel;
pub mod pool;

pub use parallel::{parallel_for, parallel_for_2d, parallel_for_2d_chunk, parallel_for_chunk};
pub use pool::{Job, ThreadPool};
