//! Sparse-set component storage for the Krill ECS runtime.
//!
//! The [`Registry`] owns one type-erased [`SparsePool`] per component type
//! and the entity lifecycle (creation, destruction, slot recycling).
//! Queries come in two flavours:
//!
//! - [`View`] — a lazy join over two or more pools with inclusion and
//!   exclusion filters, built per iteration.
//! - Groups — an eagerly maintained dense prefix of jointly-present
//!   entities, iterated through [`GroupView`] with no per-element
//!   membership checks.
//!
//! Nothing in this crate is thread-safe: parallel callers partition
//! component types across threads or synchronise externally, and push
//! parallelism into `krill-jobs` callables instead.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod erased;
pub mod group;
pub mod pool;
pub mod registry;
pub mod view;

pub use erased::ErasedPool;
pub use group::Group;
pub use pool::{SparsePool, TOMBSTONE};
pub use registry::Registry;
pub use view::{ExcludeSet, GroupView, IncludeSet, View};
