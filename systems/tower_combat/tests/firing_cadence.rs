use std::time::Duration;

use garden_defence_core::{Command, Coordinate, EnemyKind, Event, TowerKind};
use garden_defence_system_tower_combat::TowerCombat;
use garden_defence_system_tower_targeting::TowerTargeting;
use garden_defence_world::{self as world, query, PathPoints, World};

const FRAME: Duration = Duration::from_millis(1);

fn garden_with_tower(tower: Coordinate) -> World {
    let mut garden = World::new(PathPoints::parse("2 0 300 600 300").expect("valid path"));
    let mut events = Vec::new();
    world::apply(
        &mut garden,
        Command::PlaceTower {
            kind: TowerKind::Salt,
            position: tower,
        },
        &mut events,
    );
    assert!(matches!(events.as_slice(), [Event::TowerPlaced { .. }]));
    garden
}

/// Runs the per-frame pipeline and returns the frames on which effects spawned.
fn run_frames(garden: &mut World, frames: u32) -> Vec<u32> {
    let mut targeting = TowerTargeting::new();
    let mut combat = TowerCombat::new();
    let mut targets = Vec::new();
    let mut fired = Vec::new();

    for frame in 1..=frames {
        let mut events = Vec::new();
        world::apply(garden, Command::Tick { dt: FRAME }, &mut events);

        targeting.handle(
            query::play_state(garden),
            &query::tower_view(garden),
            &query::enemy_view(garden),
            &mut targets,
        );
        let mut commands = Vec::new();
        combat.handle(
            query::play_state(garden),
            &query::tower_view(garden),
            &targets,
            &mut commands,
        );
        for command in commands {
            world::apply(garden, command, &mut events);
        }
        world::apply(garden, Command::AdvanceEffects { dt: FRAME }, &mut events);

        if events
            .iter()
            .any(|event| matches!(event, Event::EffectSpawned { .. }))
        {
            fired.push(frame);
        }
    }

    fired
}

#[test]
fn salt_tower_fires_once_per_hundred_ticks() {
    let mut garden = garden_with_tower(Coordinate::new(30, 240));
    let mut events = Vec::new();
    world::apply(
        &mut garden,
        Command::SpawnEnemy {
            kind: EnemyKind::Snail,
        },
        &mut events,
    );

    let fired = run_frames(&mut garden, 300);

    assert_eq!(fired, vec![1, 102, 203]);
    assert_eq!(query::enemy_view(&garden).len(), 1, "crystals flew past the snail");
}

#[test]
fn tower_without_enemies_in_range_stays_quiet() {
    let mut garden = garden_with_tower(Coordinate::new(500, 100));
    let mut events = Vec::new();
    world::apply(
        &mut garden,
        Command::SpawnEnemy {
            kind: EnemyKind::Snail,
        },
        &mut events,
    );

    assert!(run_frames(&mut garden, 50).is_empty());
}
