//! Krill: a sparse-set ECS runtime for simulation-style applications.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Krill sub-crates. For most users, adding `krill` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use krill::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: f32 }
//! #[derive(Debug, PartialEq)]
//! struct Velocity { dx: f32 }
//!
//! let mut registry = Registry::new();
//! for i in 0..10 {
//!     let entity = registry.create();
//!     registry.add(entity, Position { x: i as f32 });
//!     if i % 2 == 0 {
//!         registry.add(entity, Velocity { dx: 0.5 });
//!     }
//! }
//!
//! // Integrate every entity that has both components.
//! registry.view::<(Position, Velocity)>().each(|pos, vel| {
//!     pos.x += vel.dx;
//! });
//!
//! assert_eq!(registry.count::<Velocity>(), 5);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `krill-core` | [`Entity`](types::Entity) handles and [`TypeKey`](types::TypeKey) identity |
//! | [`storage`] | `krill-storage` | Pools, [`Registry`](storage::Registry), views, groups |
//! | [`alloc`] | `krill-alloc` | [`Tlsf`](alloc::Tlsf) and [`Arena`](alloc::Arena) allocators |
//! | [`jobs`] | `krill-jobs` | [`ThreadPool`](jobs::ThreadPool), job DAGs, parallel-for |
//! | [`app`] | `krill-app` | [`App`](app::App) scene/state machine |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Entity handles and type identity (`krill-core`).
pub use krill_core as types;

/// Component pools, the registry, views, and groups (`krill-storage`).
pub use krill_storage as storage;

/// TLSF and arena allocators (`krill-alloc`).
pub use krill_alloc as alloc;

/// Worker pool, job DAGs, and parallel-for helpers (`krill-jobs`).
pub use krill_jobs as jobs;

/// Scene/state machine (`krill-app`).
pub use krill_app as app;

/// Common imports for typical Krill usage.
///
/// ```rust
/// use krill::prelude::*;
/// ```
pub mod prelude {
    // Identity
    pub use krill_core::{Entity, TypeKey};

    // Storage
    pub use krill_storage::{Group, GroupView, Registry, SparsePool, View};

    // Allocators
    pub use krill_alloc::{AllocConfig, AllocError, Arena, ArenaRef, Tlsf};

    // Jobs
    pub use krill_jobs::{
        parallel_for, parallel_for_2d, parallel_for_2d_chunk, parallel_for_chunk, Job, ThreadPool,
    };

    // Application flow
    pub use krill_app::{App, State, Transition};
}
