//! Generational entity handles.
//!
//! An [`Entity`] is a 64-bit value packing a 32-bit slot index in the low
//! half and a 32-bit generation in the high half. The index selects a slot
//! in each pool's sparse array; the generation distinguishes the current
//! occupant of a slot from earlier, destroyed occupants. The bit partition
//! is a public contract — applications may serialise entities, but two
//! handles with the same index only collide when their generations match.

use std::fmt;

/// Opaque, versioned identifier for an entity.
///
/// Equality, ordering, and hashing use the full 64-bit value, so a
/// recycled handle never compares equal to any handle issued for the
/// slot's previous occupant (the registry bumps the generation on reuse).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u64);

impl Entity {
    /// Number of bits used for the slot index.
    pub const INDEX_BITS: u32 = 32;
    /// Mask selecting the index half of the packed value.
    pub const INDEX_MASK: u64 = 0x0000_0000_FFFF_FFFF;
    /// Mask selecting the generation half of the packed value.
    pub const GENERATION_MASK: u64 = 0xFFFF_FFFF_0000_0000;
    /// Shift between the index and generation fields.
    pub const GENERATION_SHIFT: u32 = 32;

    /// Pack a generation and slot index into a handle.
    pub const fn new(generation: u32, index: u32) -> Self {
        Self(((generation as u64) << Self::GENERATION_SHIFT) | index as u64)
    }

    /// The slot index encoded in this handle.
    pub const fn index(self) -> u32 {
        (self.0 & Self::INDEX_MASK) as u32
    }

    /// The generation encoded in this handle.
    pub const fn generation(self) -> u32 {
        (self.0 >> Self::GENERATION_SHIFT) as u32
    }

    /// A handle for the same slot with the generation incremented.
    ///
    /// Used by the registry when a freed slot is reused; wraps on
    /// generation overflow.
    pub const fn next_generation(self) -> Self {
        Self::new(self.generation().wrapping_add(1), self.index())
    }

    /// The raw packed representation.
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Reconstruct a handle from its raw packed representation.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity(gen={}, idx={})", self.generation(), self.index())
    }
}
