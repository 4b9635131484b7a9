//! Eagerly maintained groups.
//!
//! A group claims a tuple of component types and keeps every entity that
//! possesses all of them swapped into a shared prefix of each involved
//! pool, in lock-step: position `i < len` holds the same entity in every
//! pool. Iteration through [`GroupView`] is then a straight walk over
//! the packed arrays with no membership checks.
//!
//! The registry maintains the prefix on every add (after the insert) and
//! every remove (before the delete). No two live groups may share a
//! component type, and a pool owned by a group refuses
//! [`Registry::sort`].

use smallvec::SmallVec;

use krill_core::{Entity, TypeKey};

use crate::registry::Registry;
use crate::view::{collect_pool_slots, GroupView, IncludeSet};

/// Registry-internal bookkeeping for one group.
pub(crate) struct GroupState {
    /// Type keys of the involved pools; empty once the group is dropped.
    pub(crate) types: SmallVec<[TypeKey; 4]>,
    /// Length of the lock-step prefix.
    pub(crate) len: usize,
}

/// Caller-held token for a live group.
///
/// Obtained from [`Registry::group`]; surrender it to
/// [`Registry::drop_group`] to release the watched types.
pub struct Group {
    id: usize,
    keys: SmallVec<[TypeKey; 4]>,
}

impl Group {
    /// Type keys of the pools this group owns, in tuple order.
    pub fn keys(&self) -> &[TypeKey] {
        &self.keys
    }
}

impl Registry {
    /// Create a group over the component tuple `G`.
    ///
    /// Swaps every entity of the current intersection to the front of
    /// each involved pool and registers the types as watched. Returns
    /// `None` when any type is already owned by a live group — no two
    /// groups may share a component type.
    pub fn group<G: IncludeSet>(&mut self) -> Option<Group> {
        G::ensure(self);
        let keys = G::keys();
        debug_assert!(
            keys.iter()
                .enumerate()
                .all(|(i, k)| !keys[i + 1..].contains(k)),
            "duplicate component type in group tuple"
        );
        if keys.iter().any(|k| self.watched.contains_key(k)) {
            return None;
        }

        // Candidates come from the smallest pool's dense snapshot.
        let pivot_key = *keys
            .iter()
            .min_by_key(|k| self.pools.get(*k).expect("pool created by ensure").len())
            .expect("include tuples have at least one type");
        let candidates: Vec<Entity> = {
            let pivot = self.pools.get(&pivot_key).expect("pool created by ensure");
            (0..pivot.len()).map(|i| pivot.entity_at(i)).collect()
        };
        let members: Vec<Entity> = candidates
            .into_iter()
            .filter(|&entity| {
                keys.iter().all(|k| {
                    self.pools
                        .get(k)
                        .expect("pool created by ensure")
                        .contains(entity)
                })
            })
            .collect();

        // Each member's current position is never below its target, so
        // sequential placement cannot displace an already-placed member.
        for (target, &entity) in members.iter().enumerate() {
            for key in &keys {
                let pool = self.pools.get_mut(key).expect("pool created by ensure");
                let position = pool
                    .position_of(entity)
                    .expect("member belongs to every group pool");
                pool.swap_dense(position, target);
            }
        }

        let id = self.groups.len();
        self.groups.push(GroupState {
            types: keys.clone(),
            len: members.len(),
        });
        for key in &keys {
            self.watched.insert(*key, id);
        }
        Some(Group { id, keys })
    }

    /// Release a group, unwatching its component types.
    ///
    /// The pools keep their current order; only the maintenance stops.
    pub fn drop_group(&mut self, group: Group) {
        for key in &group.keys {
            self.watched.remove(key);
        }
        let state = &mut self.groups[group.id];
        state.types.clear();
        state.len = 0;
    }

    /// Number of entities currently in the group's prefix.
    pub fn group_len(&self, group: &Group) -> usize {
        self.groups[group.id].len
    }

    /// Iterate the group's prefix with stride-1 packed access.
    ///
    /// `G` must be the same type tuple, in the same order, that created
    /// the group (debug assert).
    pub fn group_view<G: IncludeSet>(&mut self, group: &Group) -> GroupView<'_, G> {
        debug_assert_eq!(
            G::keys().as_slice(),
            group.keys.as_slice(),
            "group_view type tuple must match the group's types in order"
        );
        let prefix_len = self.groups[group.id].len;
        let keys = G::keys();
        let mut slots = collect_pool_slots(&mut self.pools, &keys, &[]);
        let pools = G::fetch(&mut slots);
        GroupView { pools, prefix_len }
    }

    /// Post-insert notification: pull `entity` into the prefix when it
    /// now possesses every involved type.
    pub(crate) fn notify_group_add(&mut self, group: usize, entity: Entity) {
        let types = self.groups[group].types.clone();
        if types.is_empty() {
            return;
        }
        let member = types.iter().all(|k| {
            self.pools
                .get(k)
                .is_some_and(|pool| pool.contains(entity))
        });
        if !member {
            return;
        }

        // The entity was not a member before this insert, so its position
        // in every pool is at or beyond the prefix.
        let len = self.groups[group].len;
        for key in &types {
            let pool = self.pools.get_mut(key).expect("group pools exist");
            let position = pool
                .position_of(entity)
                .expect("membership checked above");
            pool.swap_dense(position, len);
        }
        self.groups[group].len = len + 1;
    }

    /// Pre-delete notification: evict `entity` from the prefix while its
    /// component still exists, so the swap stays coherent.
    pub(crate) fn notify_group_remove(&mut self, group: usize, entity: Entity) {
        let types = self.groups[group].types.clone();
        if types.is_empty() {
            return;
        }
        let len = self.groups[group].len;
        if len == 0 {
            return;
        }
        let first = self.pools.get(&types[0]).expect("group pools exist");
        let Some(position) = first.position_of(entity) else {
            return;
        };
        if position >= len {
            return;
        }

        for key in &types {
            let pool = self.pools.get_mut(key).expect("group pools exist");
            let position = pool
                .position_of(entity)
                .expect("prefix member sits in every pool");
            pool.swap_dense(position, len - 1);
        }
        self.groups[group].len = len - 1;
    }
}
