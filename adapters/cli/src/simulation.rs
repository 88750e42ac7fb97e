use std::time::Duration;

use garden_defence_core::{
    Command, Coordinate, EffectSnapshot, EnemySnapshot, Event, PlacementPreview, PlayState,
    TowerSnapshot, TowerTarget,
};
use garden_defence_rendering::{Hud, Scene, SceneEffect, SceneEnemy, SceneTower, TowerPreview};
use garden_defence_system_builder::{Builder, BuilderInput};
use garden_defence_system_spawning::{Config as SpawnConfig, Spawning};
use garden_defence_system_tower_combat::TowerCombat;
use garden_defence_system_tower_targeting::TowerTargeting;
use garden_defence_world::{self as world, query, World};

/// Owns the world and the systems that decide what happens to it each frame.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    spawning: Spawning,
    builder: Builder,
    tower_targeting: TowerTargeting,
    tower_combat: TowerCombat,
    pointer: Option<Coordinate>,
    events: Vec<Event>,
    commands: Vec<Command>,
    tower_targets: Vec<TowerTarget>,
}

impl Simulation {
    pub(crate) fn new(world: World, spawn_config: SpawnConfig) -> Self {
        Self {
            world,
            spawning: Spawning::new(spawn_config),
            builder: Builder::new(),
            tower_targeting: TowerTargeting::new(),
            tower_combat: TowerCombat::new(),
            pointer: None,
            events: Vec::new(),
            commands: Vec::new(),
            tower_targets: Vec::new(),
        }
    }

    /// Runs one frame: tick, spawning, building, firing and effect updates.
    pub(crate) fn step(&mut self, dt: Duration, input: BuilderInput) {
        self.events.clear();
        self.pointer = input.pointer;

        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        let play_state = query::play_state(&self.world);
        self.spawning
            .handle(&self.events, play_state, &mut self.commands);
        self.flush_commands();

        let preview = self.preview();
        self.builder.handle(
            &self.events,
            play_state,
            input,
            query::money(&self.world),
            preview,
            &mut self.commands,
        );
        self.flush_commands();

        let towers = query::tower_view(&self.world);
        self.tower_targeting.handle(
            play_state,
            &towers,
            &query::enemy_view(&self.world),
            &mut self.tower_targets,
        );
        self.tower_combat
            .handle(play_state, &towers, &self.tower_targets, &mut self.commands);
        self.flush_commands();

        world::apply(
            &mut self.world,
            Command::AdvanceEffects { dt },
            &mut self.events,
        );
    }

    /// Events produced by the most recent [`Simulation::step`].
    pub(crate) fn events(&self) -> &[Event] {
        &self.events
    }

    pub(crate) fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            enemies: query::enemy_view(&self.world).into_vec(),
            towers: query::tower_view(&self.world).into_vec(),
            effects: query::effects(&self.world),
            preview: self.preview(),
            lives: query::lives(&self.world),
            money: query::money(&self.world),
            play_state: query::play_state(&self.world),
            frame_counter: query::frame_counter(&self.world),
        }
    }

    fn preview(&self) -> Option<PlacementPreview> {
        let kind = self.builder.placing()?;
        let pointer = self.pointer?;
        Some(query::placement_preview(&self.world, kind, pointer))
    }

    fn flush_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }
}

/// Immutable copy of everything the renderer shows for one frame.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FrameSnapshot {
    pub(crate) enemies: Vec<EnemySnapshot>,
    pub(crate) towers: Vec<TowerSnapshot>,
    pub(crate) effects: Vec<EffectSnapshot>,
    pub(crate) preview: Option<PlacementPreview>,
    pub(crate) lives: u32,
    pub(crate) money: u32,
    pub(crate) play_state: PlayState,
    pub(crate) frame_counter: u64,
}

impl FrameSnapshot {
    /// Replaces the dynamic parts of `scene` with this snapshot.
    pub(crate) fn write_scene(&self, scene: &mut Scene) {
        scene.enemies.clear();
        scene
            .enemies
            .extend(self.enemies.iter().map(|enemy| SceneEnemy {
                kind: enemy.kind,
                position: enemy.position,
            }));
        scene.towers.clear();
        scene.towers.extend(self.towers.iter().map(|tower| SceneTower {
            kind: tower.kind,
            position: tower.position,
        }));
        scene.effects.clear();
        scene
            .effects
            .extend(self.effects.iter().map(|effect| SceneEffect {
                kind: effect.kind,
                position: effect.position,
            }));
        scene.tower_preview = self
            .preview
            .map(|preview| TowerPreview::new(preview.kind, preview.position, preview.rejection));
        scene.hud = Hud {
            lives: self.lives,
            money: self.money,
        };
        scene.play_state = self.play_state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_defence_core::{EnemyKind, PlacementError, TowerKind, STARTING_MONEY};
    use garden_defence_world::PathPoints;

    const FRAME: Duration = Duration::from_millis(20);

    fn simulation(script: &str) -> Simulation {
        let path = PathPoints::parse("2 0 300 600 300").expect("valid path");
        let config = SpawnConfig::new(script).expect("valid script");
        Simulation::new(World::new(path), config)
    }

    fn press(x: i32, y: i32) -> BuilderInput {
        BuilderInput::new(Some(Coordinate::new(x, y)), true)
    }

    #[test]
    fn first_frame_spawns_from_the_script() {
        let mut simulation = simulation("s9");

        simulation.step(FRAME, BuilderInput::default());

        let snapshot = simulation.snapshot();
        assert_eq!(snapshot.frame_counter, 1);
        assert_eq!(snapshot.enemies.len(), 1);
        assert_eq!(snapshot.enemies[0].kind, EnemyKind::Snail);
        assert_eq!(snapshot.enemies[0].position, Coordinate::new(0, 300));
    }

    #[test]
    fn button_then_garden_press_builds_a_tower() {
        let mut simulation = simulation("9");

        simulation.step(FRAME, press(700, 300));
        assert!(simulation.snapshot().towers.is_empty());

        simulation.step(FRAME, press(300, 100));

        let snapshot = simulation.snapshot();
        assert_eq!(snapshot.towers.len(), 1);
        assert_eq!(snapshot.towers[0].kind, TowerKind::Salt);
        assert_eq!(snapshot.towers[0].position, Coordinate::new(300, 100));
        assert_eq!(snapshot.money, STARTING_MONEY - TowerKind::Salt.cost());
        assert_eq!(snapshot.preview, None);
    }

    #[test]
    fn armed_builder_previews_rejections_under_the_pointer() {
        let mut simulation = simulation("9");

        simulation.step(FRAME, press(700, 300));
        simulation.step(
            FRAME,
            BuilderInput::new(Some(Coordinate::new(300, 320)), false),
        );

        let preview = simulation.snapshot().preview.expect("builder is armed");
        assert_eq!(preview.rejection, Some(PlacementError::TooCloseToPath));

        simulation.step(FRAME, press(300, 320));
        assert!(simulation.snapshot().towers.is_empty());
        assert!(simulation.snapshot().preview.is_some());
    }

    #[test]
    fn escaping_enemies_end_the_game() {
        let path = PathPoints::parse("2 0 300 100 300").expect("valid path");
        let config = SpawnConfig::new("v").expect("valid script");
        let mut simulation = Simulation::new(World::new(path), config);

        let mut saw_game_over = false;
        for _ in 0..10 {
            simulation.step(Duration::from_secs(1), BuilderInput::default());
            saw_game_over |= simulation
                .events()
                .iter()
                .any(|event| matches!(event, Event::GameOver));
        }

        let snapshot = simulation.snapshot();
        assert!(saw_game_over);
        assert_eq!(snapshot.play_state, PlayState::GameOver);
        assert_eq!(snapshot.lives, 0);
    }

    #[test]
    fn snapshots_fill_the_scene() {
        let mut simulation = simulation("s");
        simulation.step(FRAME, BuilderInput::default());
        let mut scene = Scene::new(vec![Coordinate::new(0, 300), Coordinate::new(600, 300)]);

        simulation.snapshot().write_scene(&mut scene);

        assert_eq!(scene.enemies.len(), 1);
        assert_eq!(scene.hud.lives_label(), "Lives: 7");
        assert_eq!(scene.hud.money_label(), "Money: 200");
        assert!(!scene.is_game_over());
    }
}
