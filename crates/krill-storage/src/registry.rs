//! The registry: entity lifecycle plus type-erased pool ownership.
//!
//! One registry owns every component pool and the entity allocator.
//! Destroyed entity slots are recycled through a FIFO queue; the
//! generation field is bumped when a slot is reused, so stale handles
//! never alias the new occupant.
//!
//! The registry is deliberately single-threaded. Parallel workloads
//! either partition component types across `krill-jobs` callables so no
//! two threads touch the same pool, or synchronise externally. No
//! internal locking exists or should be added.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;

use indexmap::IndexMap;

use krill_core::{Entity, TypeKey};

use crate::erased::ErasedPool;
use crate::group::GroupState;
use crate::pool::SparsePool;

/// Owner of all component pools and the entity allocator.
#[derive(Default)]
pub struct Registry {
    /// Type key → erased pool, in first-use order.
    pub(crate) pools: IndexMap<TypeKey, Box<dyn ErasedPool>>,
    /// Destroyed handles awaiting reuse, oldest first.
    pub(crate) free: VecDeque<Entity>,
    /// Next fresh slot index.
    pub(crate) next_index: u32,
    /// All groups ever created; slots are inert after `drop_group`.
    pub(crate) groups: Vec<GroupState>,
    /// Component type → index of the group watching it.
    pub(crate) watched: HashMap<TypeKey, usize>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Entity lifecycle ─────────────────────────────────────────

    /// Create a new entity.
    ///
    /// Reuses the oldest destroyed slot if one exists, bumping its
    /// generation so the returned handle is distinct from every handle
    /// previously issued for that slot; otherwise claims a fresh index
    /// at generation zero.
    pub fn create(&mut self) -> Entity {
        if let Some(freed) = self.free.pop_front() {
            return freed.next_generation();
        }
        let entity = Entity::new(0, self.next_index);
        self.next_index += 1;
        entity
    }

    /// Destroy an entity: remove its component from every pool (a no-op
    /// where absent) and queue the slot for recycling.
    ///
    /// Any subsequent `contains` for this handle reports `false` in
    /// every pool.
    pub fn destroy(&mut self, entity: Entity) {
        let keys: Vec<TypeKey> = self.pools.keys().copied().collect();
        for key in keys {
            self.remove_by_key(key, entity);
        }
        self.free.push_back(entity);
    }

    /// Number of live entities (created and not yet destroyed).
    pub fn alive_count(&self) -> usize {
        self.next_index as usize - self.free.len()
    }

    /// Clear every pool, reset the entity allocator, and empty every
    /// group prefix.
    pub fn clear(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }
        self.free.clear();
        self.next_index = 0;
        for group in &mut self.groups {
            group.len = 0;
        }
    }

    // ── Component access ─────────────────────────────────────────

    /// Bind `value` to `entity`, creating the pool for `T` on first use.
    ///
    /// If a group watches `T`, it is notified after the insert and will
    /// pull the entity into its prefix when it now matches. Adding a
    /// component the entity already has is a caller contract violation
    /// (debug assert; release replaces the value).
    pub fn add<T: 'static>(&mut self, entity: Entity, value: T) {
        let key = TypeKey::of::<T>();
        self.ensure_pool::<T>();
        self.typed_pool_mut::<T>(key).insert(entity, value);

        if let Some(&group) = self.watched.get(&key) {
            self.notify_group_add(group, entity);
        }
    }

    /// Remove `entity`'s `T` component; no-op (`false`) when absent.
    ///
    /// A group watching `T` is notified before the deletion so it can
    /// shrink its prefix while the element still exists.
    pub fn remove<T: 'static>(&mut self, entity: Entity) -> bool {
        self.remove_by_key(TypeKey::of::<T>(), entity)
    }

    /// The `T` component of `entity`, if present and not stale.
    pub fn get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.pool::<T>()?.get(entity)
    }

    /// Mutable access to the `T` component of `entity`.
    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.pool_mut::<T>()?.get_mut(entity)
    }

    /// Whether `entity` currently has a `T` component.
    pub fn contains<T: 'static>(&self, entity: Entity) -> bool {
        self.pool::<T>().is_some_and(|pool| pool.contains(entity))
    }

    /// Number of live `T` components.
    pub fn count<T: 'static>(&self) -> usize {
        self.pool::<T>().map_or(0, SparsePool::len)
    }

    /// Invoke `f` once per `T` component, in dense order.
    pub fn each<T: 'static>(&mut self, f: impl FnMut(&mut T)) {
        if let Some(pool) = self.pool_mut::<T>() {
            pool.each(f);
        }
    }

    /// Invoke `f` once per `(entity, T)` pair, in dense order.
    pub fn each_entity<T: 'static>(&mut self, f: impl FnMut(Entity, &mut T)) {
        if let Some(pool) = self.pool_mut::<T>() {
            pool.each_entity(f);
        }
    }

    /// Sort the `T` pool by `cmp`.
    ///
    /// Returns `false` without touching anything when a group owns the
    /// pool — groups alone may reorder their pools.
    pub fn sort<T: 'static>(&mut self, cmp: impl FnMut(&T, &T) -> Ordering) -> bool {
        let key = TypeKey::of::<T>();
        if self.watched.contains_key(&key) {
            return false;
        }
        if let Some(pool) = self.pool_mut::<T>() {
            pool.sort_by(cmp);
        }
        true
    }

    /// The typed pool for `T`, if it has been created.
    pub fn pool<T: 'static>(&self) -> Option<&SparsePool<T>> {
        self.pools
            .get(&TypeKey::of::<T>())
            .map(|pool| downcast::<T>(pool.as_ref()))
    }

    /// Mutable typed pool for `T`, if it has been created.
    pub fn pool_mut<T: 'static>(&mut self) -> Option<&mut SparsePool<T>> {
        self.pools
            .get_mut(&TypeKey::of::<T>())
            .map(|pool| downcast_mut::<T>(pool.as_mut()))
    }

    /// A human-readable listing of every pool's sparse and dense arrays.
    ///
    /// The exact format is informative only.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (key, pool) in &self.pools {
            let _ = writeln!(
                out,
                "pool {key} ({}, len {})",
                pool.type_name(),
                pool.len()
            );
            pool.dump(&mut out);
        }
        out
    }

    // ── Internals shared with view/group code ────────────────────

    /// Create the pool for `T` if it does not exist yet.
    pub(crate) fn ensure_pool<T: 'static>(&mut self) {
        self.pools
            .entry(TypeKey::of::<T>())
            .or_insert_with(|| Box::new(SparsePool::<T>::new()));
    }

    /// Group-aware removal through the erased boundary.
    pub(crate) fn remove_by_key(&mut self, key: TypeKey, entity: Entity) -> bool {
        if let Some(&group) = self.watched.get(&key) {
            self.notify_group_remove(group, entity);
        }
        match self.pools.get_mut(&key) {
            Some(pool) => pool.remove(entity),
            None => false,
        }
    }

    fn typed_pool_mut<T: 'static>(&mut self, key: TypeKey) -> &mut SparsePool<T> {
        let pool = self
            .pools
            .get_mut(&key)
            .expect("ensure_pool ran for this key");
        downcast_mut::<T>(pool.as_mut())
    }
}

fn downcast<T: 'static>(pool: &dyn ErasedPool) -> &SparsePool<T> {
    pool.as_any()
        .downcast_ref::<SparsePool<T>>()
        .expect("pool type matches its key")
}

fn downcast_mut<T: 'static>(pool: &mut dyn ErasedPool) -> &mut SparsePool<T> {
    pool.as_any_mut()
        .downcast_mut::<SparsePool<T>>()
        .expect("pool type matches its key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(i32);
    #[derive(Debug, PartialEq)]
    struct Speed(f32);

    #[test]
    fn create_assigns_sequential_indices() {
        let mut registry = Registry::new();
        let a = registry.create();
        let b = registry.create();
        assert_eq!((a.generation(), a.index()), (0, 0));
        assert_eq!((b.generation(), b.index()), (0, 1));
        assert_eq!(registry.alive_count(), 2);
    }

    #[test]
    fn destroy_recycles_with_bumped_generation() {
        let mut registry = Registry::new();
        let a = registry.create();
        registry.destroy(a);

        let b = registry.create();
        assert_eq!(b.index(), a.index(), "oldest freed slot is reused first");
        assert_eq!(b.generation(), a.generation() + 1);
        assert_ne!(a, b);
    }

    #[test]
    fn recycling_is_fifo() {
        let mut registry = Registry::new();
        let a = registry.create();
        let b = registry.create();
        registry.destroy(a);
        registry.destroy(b);

        assert_eq!(registry.create().index(), a.index());
        assert_eq!(registry.create().index(), b.index());
    }

    #[test]
    fn add_get_remove_round_trip() {
        let mut registry = Registry::new();
        let e = registry.create();

        registry.add(e, Health(50));
        assert!(registry.contains::<Health>(e));
        assert_eq!(registry.get::<Health>(e), Some(&Health(50)));
        assert_eq!(registry.count::<Health>(), 1);

        registry.get_mut::<Health>(e).unwrap().0 = 75;
        assert_eq!(registry.get::<Health>(e), Some(&Health(75)));

        assert!(registry.remove::<Health>(e));
        assert!(!registry.contains::<Health>(e));
        assert_eq!(registry.count::<Health>(), 0);
        assert!(!registry.remove::<Health>(e), "second removal is a no-op");
    }

    #[test]
    fn add_remove_leaves_other_pools_untouched() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Health(1));
        registry.add(e, Speed(2.0));

        let healths = registry.count::<Health>();
        registry.add(e, Speed(3.0)); // replaced under debug_assert contract
        registry.remove::<Speed>(e);

        assert_eq!(registry.count::<Health>(), healths);
        assert_eq!(registry.count::<Speed>(), 0);
    }

    #[test]
    fn destroy_removes_from_every_pool() {
        let mut registry = Registry::new();
        let e = registry.create();
        let other = registry.create();
        registry.add(e, Health(1));
        registry.add(e, Speed(1.0));
        registry.add(other, Health(9));

        registry.destroy(e);

        assert!(!registry.contains::<Health>(e));
        assert!(!registry.contains::<Speed>(e));
        assert_eq!(registry.get::<Health>(other), Some(&Health(9)));
    }

    #[test]
    fn stale_handle_never_sees_recycled_slot() {
        let mut registry = Registry::new();
        let old = registry.create();
        registry.add(old, Health(1));
        registry.destroy(old);

        let recycled = registry.create();
        assert_eq!(recycled.index(), old.index());
        registry.add(recycled, Health(2));

        assert!(!registry.contains::<Health>(old));
        assert_eq!(registry.get::<Health>(old), None);
        assert_eq!(registry.get::<Health>(recycled), Some(&Health(2)));
    }

    #[test]
    fn clear_resets_entities_and_pools() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Health(1));
        let doomed = registry.create();
        registry.destroy(doomed);

        registry.clear();

        assert_eq!(registry.alive_count(), 0);
        assert_eq!(registry.count::<Health>(), 0);
        let fresh = registry.create();
        assert_eq!((fresh.generation(), fresh.index()), (0, 0));
    }

    #[test]
    fn each_applies_in_dense_order() {
        let mut registry = Registry::new();
        for i in 0..10 {
            let e = registry.create();
            registry.add(e, Health(i));
        }
        registry.each::<Health>(|h| h.0 += 100);

        let mut seen = Vec::new();
        registry.each_entity::<Health>(|e, h| seen.push((e.index(), h.0)));
        assert_eq!(seen.len(), 10);
        assert!(seen.iter().all(|&(i, h)| h == i as i32 + 100));
    }

    #[test]
    fn sort_reorders_unless_grouped() {
        let mut registry = Registry::new();
        let entities: Vec<Entity> = (0..5).map(|_| registry.create()).collect();
        for (i, &e) in entities.iter().enumerate() {
            registry.add(e, Health(5 - i as i32));
        }

        assert!(registry.sort::<Health>(|a, b| a.0.cmp(&b.0)));
        let values: Vec<i32> = registry.pool::<Health>().unwrap().components().iter().map(|h| h.0).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
        // Handles still resolve to their own values.
        assert_eq!(registry.get::<Health>(entities[0]), Some(&Health(5)));
    }

    #[test]
    fn dump_names_every_pool() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Health(1));
        registry.add(e, Speed(1.5));

        let dump = registry.dump();
        assert!(dump.contains("Health"));
        assert!(dump.contains("Speed"));
        assert!(dump.contains("dense"));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Recycled handles are always distinct from their
            /// predecessors, however churned the allocator is.
            #[test]
            fn recycled_handles_are_fresh(destroy_mask in proptest::collection::vec(any::<bool>(), 1..60)) {
                let mut registry = Registry::new();
                let mut issued = Vec::new();
                for &destroy in &destroy_mask {
                    let e = registry.create();
                    prop_assert!(
                        !issued.contains(&e),
                        "handle {e} was issued twice"
                    );
                    issued.push(e);
                    if destroy {
                        registry.destroy(e);
                    }
                }
            }
        }
    }
}
