//! Compile-time type identity.
//!
//! A [`TypeKey`] is the FNV-1a hash of a type's fully qualified name,
//! evaluated at compile time once per monomorphisation. The registry uses
//! it as the map key for component pools, so it must be stable within a
//! process and cheap to compare.
//!
//! Two distinct types hashing to the same key would silently alias their
//! pools. The `synonym-check` feature guards against this: every key
//! lookup records the type name it was derived from, and a collision
//! between different names panics with both offenders. The table behind
//! the feature is the only process-wide state in the workspace.

use std::fmt;

/// Identifies a component type within a registry.
///
/// Keys are stable for the lifetime of the process and unique per type in
/// practice (64-bit FNV-1a over the fully qualified type name).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u64);

impl TypeKey {
    /// The key for component type `T`.
    ///
    /// The hash is computed in a `const` context, so release builds pay
    /// only for loading a constant.
    pub fn of<T: 'static>() -> Self {
        let hash = fnv1a_64(std::any::type_name::<T>());

        #[cfg(feature = "synonym-check")]
        synonym::record(hash, std::any::type_name::<T>());

        Self(hash)
    }

    /// The raw hash value.
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// 64-bit FNV-1a over a string, usable in `const` contexts.
const fn fnv1a_64(s: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let bytes = s.as_bytes();
    let mut hash = OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(PRIME);
        i += 1;
    }
    hash
}

#[cfg(feature = "synonym-check")]
mod synonym {
    use std::collections::HashMap;
    use std::sync::{Mutex, OnceLock};

    static TABLE: OnceLock<Mutex<HashMap<u64, &'static str>>> = OnceLock::new();

    /// Record `hash → name`; panic if the hash is already claimed by a
    /// different type name.
    pub(super) fn record(hash: u64, name: &'static str) {
        let table = TABLE.get_or_init(|| Mutex::new(HashMap::new()));
        let mut guard = table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let existing = guard.entry(hash).or_insert(name);
        assert!(
            *existing == name,
            "type key collision: {existing:?} and {name:?} both hash to {hash:016x}"
        );
    }
}
