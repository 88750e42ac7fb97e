#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.
//!
//! Every tower targets the oldest enemy within its range. Enemy views are
//! ordered by identifier, and identifiers increase in spawn order, so the
//! first match in the view is the one that entered the path first.

use garden_defence_core::{EnemyView, PlayState, TowerTarget, TowerView};

/// Tower targeting system that assigns at most one enemy to every tower.
#[derive(Debug, Default)]
pub struct TowerTargeting;

impl TowerTargeting {
    /// Creates a new tower targeting system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments, which follow tower identifier order.
    pub fn handle(
        &mut self,
        play_state: PlayState,
        towers: &TowerView,
        enemies: &EnemyView,
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();

        if play_state != PlayState::Running || enemies.is_empty() {
            return;
        }

        for tower in towers.iter() {
            let range = tower.kind.range();
            let candidate = enemies
                .iter()
                .find(|enemy| tower.position.is_within(enemy.position, range));

            if let Some(enemy) = candidate {
                out.push(TowerTarget {
                    tower: tower.id,
                    enemy: enemy.id,
                    tower_position: tower.position,
                    enemy_position: enemy.position,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TowerTarget, TowerTargeting};
    use garden_defence_core::{
        Coordinate, EnemyId, EnemyKind, EnemySnapshot, EnemyView, PlayState, TowerId, TowerKind,
        TowerSnapshot, TowerView,
    };

    fn tower_view(snapshots: Vec<TowerSnapshot>) -> TowerView {
        TowerView::from_snapshots(snapshots)
    }

    fn enemy_view(snapshots: Vec<EnemySnapshot>) -> EnemyView {
        EnemyView::from_snapshots(snapshots)
    }

    fn tower_snapshot(id: u32, position: (i32, i32)) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            kind: TowerKind::Salt,
            position: Coordinate::new(position.0, position.1),
            ticks_since_fired: 0,
        }
    }

    fn enemy_snapshot(id: u32, position: (i32, i32)) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Snail,
            position: Coordinate::new(position.0, position.1),
        }
    }

    #[test]
    fn targets_enemy_within_range() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(1, (200, 200))]);
        let enemies = enemy_view(vec![enemy_snapshot(2, (260, 280))]);

        let mut out = Vec::new();
        system.handle(PlayState::Running, &towers, &enemies, &mut out);

        assert_eq!(
            out,
            vec![TowerTarget {
                tower: TowerId::new(1),
                enemy: EnemyId::new(2),
                tower_position: Coordinate::new(200, 200),
                enemy_position: Coordinate::new(260, 280),
            }]
        );
    }

    #[test]
    fn enemy_just_outside_range_is_ignored() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(1, (200, 200))]);
        let enemies = enemy_view(vec![enemy_snapshot(2, (260, 281))]);

        let mut out = Vec::new();
        system.handle(PlayState::Running, &towers, &enemies, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn oldest_enemy_wins_over_closer_newcomer() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(1, (100, 100))]);
        let enemies = enemy_view(vec![
            enemy_snapshot(9, (101, 100)),
            enemy_snapshot(4, (180, 100)),
        ]);

        let mut out = Vec::new();
        system.handle(PlayState::Running, &towers, &enemies, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].enemy, EnemyId::new(4));
    }

    #[test]
    fn towers_may_share_a_target() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(3, (50, 50)), tower_snapshot(1, (150, 50))]);
        let enemies = enemy_view(vec![enemy_snapshot(0, (100, 50))]);

        let mut out = Vec::new();
        system.handle(PlayState::Running, &towers, &enemies, &mut out);

        let towers: Vec<TowerId> = out.iter().map(|target| target.tower).collect();
        assert_eq!(towers, vec![TowerId::new(1), TowerId::new(3)]);
        assert!(out.iter().all(|target| target.enemy == EnemyId::new(0)));
    }

    #[test]
    fn game_over_clears_output() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(1, (0, 0))]);
        let enemies = enemy_view(vec![enemy_snapshot(1, (1, 1))]);

        let mut out = vec![TowerTarget {
            tower: TowerId::new(99),
            enemy: EnemyId::new(99),
            tower_position: Coordinate::new(0, 0),
            enemy_position: Coordinate::new(0, 0),
        }];

        system.handle(PlayState::GameOver, &towers, &enemies, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_collections_produce_no_targets() {
        let mut system = TowerTargeting::new();
        let mut out = Vec::new();

        system.handle(
            PlayState::Running,
            &tower_view(Vec::new()),
            &enemy_view(vec![enemy_snapshot(1, (1, 1))]),
            &mut out,
        );
        assert!(out.is_empty());

        system.handle(
            PlayState::Running,
            &tower_view(vec![tower_snapshot(1, (0, 0))]),
            &enemy_view(Vec::new()),
            &mut out,
        );
        assert!(out.is_empty());
    }
}
