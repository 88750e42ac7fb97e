#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Garden Defence.

mod effects;
mod path;
mod towers;

use std::time::Duration;

use garden_defence_core::{
    Command, Coordinate, EffectId, EnemyId, EnemyKind, Event, PlacementError, TowerId, TowerKind,
    PATH_CLEARANCE, PLAY_AREA, STARTING_LIVES, STARTING_MONEY, WELCOME_BANNER,
};

pub use path::{PathError, PathPoints, PathPosition};

use effects::EffectState;
use towers::TowerRegistry;

/// Represents the authoritative Garden Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    path: PathPoints,
    enemies: Vec<Enemy>,
    towers: TowerRegistry,
    effects: Vec<EffectState>,
    lives: u32,
    money: u32,
    frame_counter: u64,
    game_over: bool,
    next_enemy_id: EnemyId,
    next_effect_id: EffectId,
}

impl World {
    /// Creates a fresh garden laid out along the provided path.
    #[must_use]
    pub fn new(path: PathPoints) -> Self {
        Self {
            banner: WELCOME_BANNER,
            path,
            enemies: Vec::new(),
            towers: TowerRegistry::new(),
            effects: Vec::new(),
            lives: STARTING_LIVES,
            money: STARTING_MONEY,
            frame_counter: 0,
            game_over: false,
            next_enemy_id: EnemyId::new(0),
            next_effect_id: EffectId::new(0),
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.game_over {
            return;
        }

        if self.lives == 0 {
            self.game_over = true;
            log::info!(
                "game over after {} frames with {} money",
                self.frame_counter,
                self.money
            );
            out_events.push(Event::GameOver);
            return;
        }

        self.frame_counter = self.frame_counter.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        let seconds = dt.as_secs_f64();
        let mut index = 0;
        while index < self.enemies.len() {
            let enemy = &mut self.enemies[index];
            enemy.position.advance(enemy.kind.speed() * seconds);
            if !enemy.position.is_at_the_end() {
                index += 1;
                continue;
            }

            let escaped = self.enemies.remove(index);
            let lives_lost = escaped.kind.life_cost().min(self.lives);
            self.lives -= lives_lost;
            log::debug!(
                "{:?} {} reached the end, {} lives left",
                escaped.kind,
                escaped.id.get(),
                self.lives
            );
            out_events.push(Event::EnemyReachedEnd {
                enemy: escaped.id,
                kind: escaped.kind,
                lives_lost,
            });
        }

        self.towers.advance_cooldowns();
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, out_events: &mut Vec<Event>) {
        if self.game_over {
            return;
        }

        let id = self.next_enemy_id;
        self.next_enemy_id = id.next();
        self.enemies.push(Enemy {
            id,
            kind,
            position: self.path.start(),
        });
        log::debug!("spawned {:?} {}", kind, id.get());
        out_events.push(Event::EnemySpawned { enemy: id, kind });
    }

    fn place_tower(&mut self, kind: TowerKind, position: Coordinate, out_events: &mut Vec<Event>) {
        if let Some(reason) = self.placement_rejection(kind, position) {
            log::warn!(
                "rejected {:?} tower at ({}, {}): {:?}",
                kind,
                position.x(),
                position.y(),
                reason
            );
            out_events.push(Event::TowerPlacementRejected {
                kind,
                position,
                reason,
            });
            return;
        }

        self.money -= kind.cost();
        let tower = self.towers.insert(kind, position);
        log::info!(
            "placed {:?} tower {} at ({}, {}), {} money left",
            kind,
            tower.get(),
            position.x(),
            position.y(),
            self.money
        );
        out_events.push(Event::TowerPlaced {
            tower,
            kind,
            position,
        });
    }

    fn placement_rejection(&self, kind: TowerKind, position: Coordinate) -> Option<PlacementError> {
        if self.game_over {
            return Some(PlacementError::GameOver);
        }

        if !PLAY_AREA.contains(position) {
            return Some(PlacementError::OutOfBounds);
        }

        if self.path.distance_to_path(position) <= PATH_CLEARANCE {
            return Some(PlacementError::TooCloseToPath);
        }

        if self.money < kind.cost() {
            return Some(PlacementError::InsufficientFunds);
        }

        None
    }

    fn fire_effect(&mut self, tower: TowerId, target: Coordinate, out_events: &mut Vec<Event>) {
        if self.game_over {
            return;
        }

        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        if !state.kind.is_ready(state.ticks_since_fired) {
            return;
        }

        state.ticks_since_fired = 0;
        let kind = state.kind.effect();
        let origin = state.position;

        let effect = self.next_effect_id;
        self.next_effect_id = effect.next();
        self.effects.push(EffectState::launch(effect, kind, origin, target));
        out_events.push(Event::EffectSpawned {
            effect,
            kind,
            tower,
            target,
        });
    }

    fn advance_effects(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.game_over {
            return;
        }

        for effect in &mut self.effects {
            effect.advance(dt);

            let centre = effect.position();
            let radius = effect.kind.hit_radius();
            let mut index = 0;
            while index < self.enemies.len() {
                let position = self.enemies[index].position.coordinate();
                if !centre.is_within(position, radius) {
                    index += 1;
                    continue;
                }

                let destroyed = self.enemies.remove(index);
                let reward = effect.kind.reward();
                self.money = self.money.saturating_add(reward);
                out_events.push(Event::EnemyDestroyed {
                    enemy: destroyed.id,
                    kind: destroyed.kind,
                    effect: effect.id,
                    reward,
                });
            }
        }

        self.effects.retain(|effect| {
            if effect.is_expired() {
                out_events.push(Event::EffectExpired { effect: effect.id });
                false
            } else {
                true
            }
        });
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    position: PathPosition,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnEnemy { kind } => world.spawn_enemy(kind, out_events),
        Command::PlaceTower { kind, position } => world.place_tower(kind, position, out_events),
        Command::FireEffect { tower, target } => world.fire_effect(tower, target, out_events),
        Command::AdvanceEffects { dt } => world.advance_effects(dt, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use garden_defence_core::{
        Coordinate, EffectSnapshot, EnemySnapshot, EnemyView, PlacementPreview, PlayState,
        TowerKind, TowerView,
    };

    use super::{PathPoints, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the garden path.
    #[must_use]
    pub fn path(world: &World) -> &PathPoints {
        &world.path
    }

    /// Captures a read-only view of the enemies on the path.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|enemy| EnemySnapshot {
                    id: enemy.id,
                    kind: enemy.kind,
                    position: enemy.position.coordinate(),
                })
                .collect(),
        )
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Snapshots of every live effect in launch order.
    #[must_use]
    pub fn effects(world: &World) -> Vec<EffectSnapshot> {
        world.effects.iter().map(|effect| effect.snapshot()).collect()
    }

    /// Lives the player has left.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Money available for building.
    #[must_use]
    pub fn money(world: &World) -> u32 {
        world.money
    }

    /// Number of frames the world has simulated.
    #[must_use]
    pub fn frame_counter(world: &World) -> u64 {
        world.frame_counter
    }

    /// Reports whether the world still accepts gameplay commands.
    #[must_use]
    pub fn play_state(world: &World) -> PlayState {
        if world.game_over {
            PlayState::GameOver
        } else {
            PlayState::Running
        }
    }

    /// Describes whether a tower could be placed at the position right now.
    #[must_use]
    pub fn placement_preview(
        world: &World,
        kind: TowerKind,
        position: Coordinate,
    ) -> PlacementPreview {
        PlacementPreview::new(kind, position, world.placement_rejection(kind, position))
    }
}
