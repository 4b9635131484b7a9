//! Lazy joins over component pools.
//!
//! A [`View`] borrows the pools of its inclusion tuple mutably and its
//! exclusion tuple immutably for the duration of the query. Iteration
//! picks the smallest inclusion pool as the *pivot*, walks its dense
//! array, and filters every candidate against the remaining pools. An
//! entity is visited exactly once iff it has every included component
//! and none of the excluded ones.
//!
//! Because the view owns the pool borrows, the pools cannot be mutated
//! mid-iteration at all — the hazard of adding or removing components of
//! the pivot type while iterating is unrepresentable rather than a
//! runtime error. A view with no included types has no implementation
//! and fails to compile.
//!
//! [`GroupView`] is the eager counterpart: it iterates the lock-step
//! prefix maintained by a group with direct packed indexing and no
//! per-element membership checks.

use std::marker::PhantomData;

use indexmap::IndexMap;
use smallvec::{smallvec, SmallVec};

use krill_core::{Entity, TypeKey};

use crate::erased::ErasedPool;
use crate::pool::SparsePool;
use crate::registry::Registry;

/// A tuple of component types a query must include.
///
/// Implemented for tuples of arity 1 through 4. There is deliberately no
/// arity-0 implementation: a view must include at least one type.
pub trait IncludeSet {
    /// Mutable pool references for each included type.
    type Pools<'a>;

    /// Type keys of the included types, in tuple order.
    fn keys() -> SmallVec<[TypeKey; 4]>;

    /// Create any missing pools so every key resolves.
    fn ensure(registry: &mut Registry);

    /// Take the typed pools out of the prepared borrow slots.
    fn fetch<'a>(slots: &mut [Option<&'a mut dyn ErasedPool>]) -> Self::Pools<'a>;
}

/// A tuple of component types a query must exclude.
///
/// `()` means no exclusions; tuples up to arity 4 are supported.
pub trait ExcludeSet {
    /// Type keys of the excluded types, in tuple order.
    fn keys() -> SmallVec<[TypeKey; 4]>;

    /// Create any missing pools so every key resolves.
    fn ensure(registry: &mut Registry);
}

impl ExcludeSet for () {
    fn keys() -> SmallVec<[TypeKey; 4]> {
        SmallVec::new()
    }

    fn ensure(_registry: &mut Registry) {}
}

/// Lazy join over the pools of `I`, excluding entities present in any
/// pool of `X`.
///
/// Obtained from [`Registry::view`] / [`Registry::view_filtered`]; holds
/// its pool borrows until dropped.
pub struct View<'a, I: IncludeSet, X: ExcludeSet = ()> {
    include: I::Pools<'a>,
    exclude: SmallVec<[&'a mut dyn ErasedPool; 2]>,
    _filter: PhantomData<X>,
}

/// Prefix iterator over the pools of a group, obtained from
/// [`Registry::group_view`](crate::registry::Registry::group_view).
pub struct GroupView<'a, G: IncludeSet> {
    pub(crate) pools: G::Pools<'a>,
    pub(crate) prefix_len: usize,
}

impl Registry {
    /// Build a view over the inclusion tuple `I`, creating missing pools.
    ///
    /// ```
    /// # use krill_storage::Registry;
    /// let mut registry = Registry::new();
    /// let e = registry.create();
    /// registry.add(e, 1i32);
    /// registry.add(e, 2.0f64);
    /// let mut sum = 0.0;
    /// registry.view::<(i32, f64)>().each(|a, b| sum = *a as f64 + *b);
    /// assert_eq!(sum, 3.0);
    /// ```
    pub fn view<I: IncludeSet>(&mut self) -> View<'_, I> {
        self.view_filtered::<I, ()>()
    }

    /// Build a view over `I` that skips entities present in any pool of
    /// the exclusion tuple `X`.
    ///
    /// Listing a type in both tuples, or twice in `I`, is a caller
    /// contract violation (debug assert).
    pub fn view_filtered<I: IncludeSet, X: ExcludeSet>(&mut self) -> View<'_, I, X> {
        I::ensure(self);
        X::ensure(self);
        let include_keys = I::keys();
        let exclude_keys = X::keys();
        debug_assert!(
            pairwise_distinct(&include_keys),
            "duplicate component type in view include list"
        );
        debug_assert!(
            include_keys.iter().all(|k| !exclude_keys.contains(k)),
            "a component type cannot be both included and excluded"
        );

        let mut slots = collect_pool_slots(&mut self.pools, &include_keys, &exclude_keys);
        let (include_slots, exclude_slots) = slots.split_at_mut(include_keys.len());
        let include = I::fetch(include_slots);
        let exclude = exclude_slots
            .iter_mut()
            .map(|slot| slot.take().expect("pool created by ensure"))
            .collect();
        View {
            include,
            exclude,
            _filter: PhantomData,
        }
    }
}

/// Borrow each pool named in `first` ++ `second` out of the map, in slot
/// order. Every key must be distinct; missing pools leave a `None` slot.
pub(crate) fn collect_pool_slots<'a>(
    pools: &'a mut IndexMap<TypeKey, Box<dyn ErasedPool>>,
    first: &[TypeKey],
    second: &[TypeKey],
) -> Vec<Option<&'a mut dyn ErasedPool>> {
    let mut slots: Vec<Option<&'a mut dyn ErasedPool>> = Vec::new();
    slots.resize_with(first.len() + second.len(), || None);
    for (key, pool) in pools.iter_mut() {
        if let Some(i) = first.iter().position(|k| k == key) {
            slots[i] = Some(pool.as_mut());
        } else if let Some(j) = second.iter().position(|k| k == key) {
            slots[first.len() + j] = Some(pool.as_mut());
        }
    }
    slots
}

fn pairwise_distinct(keys: &[TypeKey]) -> bool {
    keys.iter()
        .enumerate()
        .all(|(i, k)| !keys[i + 1..].contains(k))
}

macro_rules! impl_view_arity {
    ($(($T:ident, $idx:tt)),+) => {
        impl<$($T: 'static),+> IncludeSet for ($($T,)+) {
            type Pools<'a> = ($(&'a mut SparsePool<$T>,)+);

            fn keys() -> SmallVec<[TypeKey; 4]> {
                smallvec![$(TypeKey::of::<$T>()),+]
            }

            fn ensure(registry: &mut Registry) {
                $(registry.ensure_pool::<$T>();)+
            }

            fn fetch<'a>(slots: &mut [Option<&'a mut dyn ErasedPool>]) -> Self::Pools<'a> {
                ($(slots[$idx]
                    .take()
                    .expect("pool created by ensure")
                    .as_any_mut()
                    .downcast_mut::<SparsePool<$T>>()
                    .expect("pool type matches its key"),)+)
            }
        }

        impl<'a, $($T: 'static,)+ X: ExcludeSet> View<'a, ($($T,)+), X> {
            /// Invoke `f` once per entity that has every included
            /// component and none of the excluded ones, in the pivot
            /// pool's dense order.
            pub fn each(&mut self, mut f: impl FnMut($(&mut $T),+)) {
                let (pivot, len) = self.pivot();
                for i in 0..len {
                    let entity = match pivot {
                        $($idx => self.include.$idx.entity_at(i),)+
                        _ => unreachable!("pivot is an include index"),
                    };
                    if !(true $(&& self.include.$idx.contains(entity))+) {
                        continue;
                    }
                    if self.exclude.iter().any(|pool| pool.contains(entity)) {
                        continue;
                    }
                    f($(self.include.$idx.get_mut(entity).expect("membership checked above")),+);
                }
            }

            /// Like [`View::each`], with the entity as leading argument.
            pub fn each_entity(&mut self, mut f: impl FnMut(Entity, $(&mut $T),+)) {
                let (pivot, len) = self.pivot();
                for i in 0..len {
                    let entity = match pivot {
                        $($idx => self.include.$idx.entity_at(i),)+
                        _ => unreachable!("pivot is an include index"),
                    };
                    if !(true $(&& self.include.$idx.contains(entity))+) {
                        continue;
                    }
                    if self.exclude.iter().any(|pool| pool.contains(entity)) {
                        continue;
                    }
                    f(entity, $(self.include.$idx.get_mut(entity).expect("membership checked above")),+);
                }
            }

            /// Index and length of the smallest inclusion pool.
            fn pivot(&self) -> (usize, usize) {
                let mut pivot = 0usize;
                let mut len = usize::MAX;
                $(if self.include.$idx.len() < len {
                    len = self.include.$idx.len();
                    pivot = $idx;
                })+
                (pivot, len)
            }
        }

        impl<'a, $($T: 'static),+> GroupView<'a, ($($T,)+)> {
            /// Invoke `f` once per group member with stride-1 access into
            /// every packed array — no per-element membership checks.
            pub fn each(&mut self, mut f: impl FnMut($(&mut $T),+)) {
                for i in 0..self.prefix_len {
                    f($(self.pools.$idx.component_at_mut(i)),+);
                }
            }

            /// Like [`GroupView::each`], with the entity as leading
            /// argument.
            pub fn each_entity(&mut self, mut f: impl FnMut(Entity, $(&mut $T),+)) {
                for i in 0..self.prefix_len {
                    let entity = self.pools.0.entity_at(i);
                    f(entity, $(self.pools.$idx.component_at_mut(i)),+);
                }
            }

            /// Number of entities in the group prefix.
            pub fn len(&self) -> usize {
                self.prefix_len
            }

            /// Whether the group prefix is empty.
            pub fn is_empty(&self) -> bool {
                self.prefix_len == 0
            }
        }
    };
}

macro_rules! impl_exclude_arity {
    ($($T:ident),+) => {
        impl<$($T: 'static),+> ExcludeSet for ($($T,)+) {
            fn keys() -> SmallVec<[TypeKey; 4]> {
                smallvec![$(TypeKey::of::<$T>()),+]
            }

            fn ensure(registry: &mut Registry) {
                $(registry.ensure_pool::<$T>();)+
            }
        }
    };
}

impl_view_arity!((A, 0));
impl_view_arity!((A, 0), (B, 1));
impl_view_arity!((A, 0), (B, 1), (C, 2));
impl_view_arity!((A, 0), (B, 1), (C, 2), (D, 3));

impl_exclude_arity!(A);
impl_exclude_arity!(A, B);
impl_exclude_arity!(A, B, C);
impl_exclude_arity!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pos(i32);
    #[derive(Debug, PartialEq)]
    struct Vel(i32);
    struct Frozen;

    fn world() -> (Registry, Vec<Entity>) {
        // Entities 0..6: all have Pos, even ones have Vel, entity 4 is Frozen.
        let mut registry = Registry::new();
        let entities: Vec<Entity> = (0..6).map(|_| registry.create()).collect();
        for (i, &e) in entities.iter().enumerate() {
            registry.add(e, Pos(i as i32));
            if i % 2 == 0 {
                registry.add(e, Vel(10 * i as i32));
            }
        }
        registry.add(entities[4], Frozen);
        (registry, entities)
    }

    #[test]
    fn single_type_view_visits_whole_pool() {
        let (mut registry, _) = world();
        let mut count = 0;
        registry.view::<(Pos,)>().each(|p| {
            p.0 += 1;
            count += 1;
        });
        assert_eq!(count, 6);
    }

    #[test]
    fn join_visits_intersection_once_each() {
        let (mut registry, entities) = world();
        let mut seen = Vec::new();
        registry
            .view::<(Pos, Vel)>()
            .each_entity(|e, p, v| seen.push((e, p.0, v.0)));

        assert_eq!(seen.len(), 3, "entities 0, 2, 4 have both components");
        for &(e, p, v) in &seen {
            let i = entities.iter().position(|&x| x == e).unwrap();
            assert_eq!(p, i as i32);
            assert_eq!(v, 10 * i as i32);
        }
    }

    #[test]
    fn exclusion_removes_matching_entities() {
        let (mut registry, entities) = world();
        let mut seen = Vec::new();
        registry
            .view_filtered::<(Pos, Vel), (Frozen,)>()
            .each_entity(|e, _, _| seen.push(e));

        assert_eq!(seen, vec![entities[0], entities[2]], "entity 4 is frozen");
    }

    #[test]
    fn view_mutations_are_visible_afterwards() {
        let (mut registry, entities) = world();
        registry.view::<(Pos, Vel)>().each(|p, v| p.0 += v.0);
        assert_eq!(registry.get::<Pos>(entities[2]), Some(&Pos(22)));
        assert_eq!(
            registry.get::<Pos>(entities[1]),
            Some(&Pos(1)),
            "entities without Vel are untouched"
        );
    }

    #[test]
    fn pivot_is_the_smallest_pool() {
        // Vel is smaller, so iteration follows Vel's dense order.
        let (mut registry, _) = world();
        let vel_order: Vec<Entity> = registry.pool::<Vel>().unwrap().entities().to_vec();
        let mut visit_order = Vec::new();
        registry
            .view::<(Pos, Vel)>()
            .each_entity(|e, _, _| visit_order.push(e));
        assert_eq!(visit_order, vel_order);
    }

    #[test]
    fn view_on_empty_registry_is_empty() {
        let mut registry = Registry::new();
        let mut count = 0;
        registry.view::<(Pos, Vel)>().each(|_, _| count += 1);
        assert_eq!(count, 0);
        // The pools were created lazily by the view.
        assert_eq!(registry.count::<Pos>(), 0);
    }

    #[test]
    fn four_way_join() {
        let mut registry = Registry::new();
        let full = registry.create();
        let partial = registry.create();
        registry.add(full, 1u8);
        registry.add(full, 2u16);
        registry.add(full, 3u32);
        registry.add(full, 4u64);
        registry.add(partial, 1u8);
        registry.add(partial, 2u16);

        let mut sum = 0u64;
        registry
            .view::<(u8, u16, u32, u64)>()
            .each(|a, b, c, d| sum += *a as u64 + *b as u64 + *c as u64 + *d);
        assert_eq!(sum, 10, "only the fully populated entity matches");
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        proptest! {
            /// A filtered view visits exactly (A ∩ B) \ X, each entity
            /// once, for arbitrary membership masks.
            #[test]
            fn view_matches_set_algebra(
                masks in proptest::collection::vec(0u8..8, 1..60),
            ) {
                let mut registry = Registry::new();
                let mut expected = BTreeSet::new();
                for &mask in &masks {
                    let e = registry.create();
                    if mask & 1 != 0 {
                        registry.add(e, Pos(0));
                    }
                    if mask & 2 != 0 {
                        registry.add(e, Vel(0));
                    }
                    if mask & 4 != 0 {
                        registry.add(e, Frozen);
                    }
                    if mask & 3 == 3 && mask & 4 == 0 {
                        expected.insert(e);
                    }
                }

                let mut visited = Vec::new();
                registry
                    .view_filtered::<(Pos, Vel), (Frozen,)>()
                    .each_entity(|e, _, _| visited.push(e));

                let visited_set: BTreeSet<Entity> = visited.iter().copied().collect();
                prop_assert_eq!(
                    visited.len(),
                    visited_set.len(),
                    "an entity was visited twice"
                );
                prop_assert_eq!(visited_set, expected);
            }
        }
    }
}
