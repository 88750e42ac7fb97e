//! Authoritative tower state management utilities.

use std::collections::BTreeMap;

use garden_defence_core::{Coordinate, TowerId, TowerKind, TowerSnapshot};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Centre of the tower.
    pub(crate) position: Coordinate,
    /// Ticks elapsed since the tower last fired.
    pub(crate) ticks_since_fired: u32,
}

impl TowerState {
    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            ticks_since_fired: self.ticks_since_fired,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a freshly placed tower and returns its identifier.
    pub(crate) fn insert(&mut self, kind: TowerKind, position: Coordinate) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = id.next();
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                kind,
                position,
                ticks_since_fired: kind.initial_ticks_since_fired(),
            },
        );
        id
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    /// Counts one more tick on every tower's cooldown.
    pub(crate) fn advance_cooldowns(&mut self) {
        for tower in self.entries.values_mut() {
            tower.ticks_since_fired = tower.ticks_since_fired.saturating_add(1);
        }
    }
}
