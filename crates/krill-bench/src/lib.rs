//! Benchmark profiles and population helpers for the Krill runtime.
//!
//! Provides pre-built registry populations shared by the criterion
//! benches and usable from examples:
//!
//! - [`mixed_registry`]: every entity carries `Mass`, alternating
//!   entities carry `Charge` or `Tag` — the reference workload shape
//! - [`saturated_registry`]: every entity carries all three components

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use krill_core::Entity;
use krill_storage::Registry;

/// Integer payload present on every entity in the profiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mass {
    /// Payload value.
    pub value: i32,
}

/// Float payload present on half (mixed) or all (saturated) entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Charge {
    /// Payload value.
    pub value: f64,
}

/// Byte payload present on the other half (mixed) or all (saturated)
/// entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tag {
    /// Payload value.
    pub value: u8,
}

/// Build a registry where every entity has [`Mass`], odd entities have
/// [`Charge`], and even entities have [`Tag`].
pub fn mixed_registry(entity_count: usize) -> (Registry, Vec<Entity>) {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..entity_count).map(|_| registry.create()).collect();
    for (i, &e) in entities.iter().enumerate() {
        registry.add(e, Mass { value: 1 });
        if i % 2 == 1 {
            registry.add(e, Charge { value: 0.3 });
        } else {
            registry.add(e, Tag { value: b'a' });
        }
    }
    (registry, entities)
}

/// Build a registry where every entity has all three components.
pub fn saturated_registry(entity_count: usize) -> (Registry, Vec<Entity>) {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..entity_count).map(|_| registry.create()).collect();
    for (i, &e) in entities.iter().enumerate() {
        registry.add(e, Mass { value: i as i32 });
        registry.add(e, Charge { value: i as f64 });
        registry.add(e, Tag { value: (i % 251) as u8 });
    }
    (registry, entities)
}
