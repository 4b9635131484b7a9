//! Bounded-memory allocators for the Krill ECS runtime.
//!
//! Two engines over caller-supplied byte buffers:
//!
//! - [`Tlsf`] — a Two-Level Segregated Fit free-list allocator with O(1)
//!   allocate/deallocate, block splitting, and bidirectional coalescing.
//!   Use it when individual allocations must be freed.
//! - [`Arena`] — a monotonic bump allocator with chained blocks and bulk
//!   [`Arena::reset`]. Individual frees are intentionally absent.
//!
//! Neither engine touches system memory beyond the buffers it owns, and
//! neither is thread-safe — callers that allocate concurrently own one
//! engine per thread or synchronise externally.
//!
//! All addressing is by byte offset into the owned buffer rather than by
//! pointer, which keeps the crate free of `unsafe`. The typed adapters in
//! [`typed`] layer an element-count interface on top.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod tlsf;
pub mod typed;

pub use arena::{Arena, ArenaRef};
pub use config::AllocConfig;
pub use error::AllocError;
pub use tlsf::Tlsf;
pub use typed::{ArenaPool, TlsfPool, TypedBlock};
