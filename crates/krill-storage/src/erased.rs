//! Type-erased pool boundary.
//!
//! The registry stores one pool per component type behind [`ErasedPool`].
//! Only type-independent operations cross this boundary — removal,
//! membership, clearing, sizing, position bookkeeping for groups, and
//! debug dumping. Typed access (`insert`, `get`, `each`) happens on the
//! concrete [`SparsePool`] recovered through the `Any` hooks and never
//! goes through the trait.

use std::any::Any;

use krill_core::{Entity, TypeKey};

use crate::pool::SparsePool;

/// Object-safe surface of a component pool.
pub trait ErasedPool: Any {
    /// Key of the component type this pool stores.
    fn type_key(&self) -> TypeKey;

    /// Human-readable name of the component type.
    fn type_name(&self) -> &'static str;

    /// Remove `entity`'s component; no-op (`false`) when absent.
    fn remove(&mut self, entity: Entity) -> bool;

    /// Whether `entity` has a component in this pool.
    fn contains(&self, entity: Entity) -> bool;

    /// Dense position of `entity`'s component, if present.
    fn position_of(&self, entity: Entity) -> Option<usize>;

    /// Exchange two dense positions, keeping all indices coherent.
    fn swap_dense(&mut self, i: usize, j: usize);

    /// The entity at dense position `i`.
    fn entity_at(&self, i: usize) -> Entity;

    /// Number of live components.
    fn len(&self) -> usize;

    /// Whether the pool holds no components.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every component.
    fn clear(&mut self);

    /// Append a sparse/dense listing to `out` (informative only).
    fn dump(&self, out: &mut String);

    /// Downcast hook for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast hook for typed access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> ErasedPool for SparsePool<T> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn remove(&mut self, entity: Entity) -> bool {
        SparsePool::remove(self, entity)
    }

    fn contains(&self, entity: Entity) -> bool {
        SparsePool::contains(self, entity)
    }

    fn position_of(&self, entity: Entity) -> Option<usize> {
        SparsePool::position_of(self, entity)
    }

    fn swap_dense(&mut self, i: usize, j: usize) {
        SparsePool::swap_dense(self, i, j);
    }

    fn entity_at(&self, i: usize) -> Entity {
        SparsePool::entity_at(self, i)
    }

    fn len(&self) -> usize {
        SparsePool::len(self)
    }

    fn clear(&mut self) {
        SparsePool::clear(self);
    }

    fn dump(&self, out: &mut String) {
        SparsePool::dump(self, out);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
