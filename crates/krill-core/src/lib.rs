//! Core identifiers for the Krill ECS runtime.
//!
//! This is the leaf crate with zero internal Krill dependencies. It defines
//! the two identities everything else is keyed on: the generational
//! [`Entity`] handle and the compile-time [`TypeKey`] used to address
//! component pools.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod entity;
pub mod type_key;

pub use entity::Entity;
pub use type_key::TypeKey;
