#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Garden Defence experience.

mod game_loop;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use garden_defence_core::{Coordinate, Event};
use garden_defence_rendering::{Color, Presentation, RenderingBackend, Scene};
use garden_defence_rendering_macroquad::MacroquadBackend;
use garden_defence_system_bootstrap::Bootstrap;
use garden_defence_system_builder::BuilderInput;
use garden_defence_system_spawning::Config as SpawnConfig;
use garden_defence_world::query;

use crate::{
    game_loop::{InputForwarder, LoopConfig, DEFAULT_FRAME_WAIT_MS},
    simulation::Simulation,
};

const WINDOW_TITLE: &str = "Garden Defence";
const HEADLESS_FRAME: Duration = Duration::from_millis(20);

/// Command-line arguments accepted by the Garden Defence binary.
#[derive(Debug, Parser)]
#[command(name = "garden-defence", about = "Defend the garden from snails.")]
struct CliArgs {
    /// Path definition file: a point count followed by that many x y pairs.
    #[arg(long, value_name = "PATH")]
    path_file: Option<PathBuf>,
    /// TOML manifest listing sprite images; primitive shapes are drawn without it.
    #[arg(long, value_name = "PATH")]
    sprite_manifest: Option<PathBuf>,
    /// Pause between simulation frames in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_FRAME_WAIT_MS)]
    frame_wait_ms: u64,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long, value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
    vsync: bool,
    /// Log the render frame rate once per second.
    #[arg(long)]
    show_fps: bool,
    /// Run this many 20 ms frames without opening a window, then exit.
    #[arg(long, value_name = "N")]
    headless_frames: Option<u64>,
}

/// Entry point for the Garden Defence command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();

    let bootstrap = Bootstrap;
    let world = bootstrap.world(args.path_file.as_deref())?;
    log::info!("{}", bootstrap.welcome_banner(&world));

    let path = query::path(&world).points().to_vec();
    let simulation = Simulation::new(world, SpawnConfig::default());

    match args.headless_frames {
        Some(frames) => {
            run_headless(simulation, frames);
            Ok(())
        }
        None => run_windowed(&args, path, simulation),
    }
}

fn run_headless(mut simulation: Simulation, frames: u64) {
    let mut destroyed = 0_u32;
    let mut escaped = 0_u32;
    for _ in 0..frames {
        simulation.step(HEADLESS_FRAME, BuilderInput::default());
        for event in simulation.events() {
            match event {
                Event::EnemyDestroyed { .. } => destroyed += 1,
                Event::EnemyReachedEnd { .. } => escaped += 1,
                _ => {}
            }
        }
    }

    let snapshot = simulation.snapshot();
    log::info!(
        "headless run finished after {} frames: {:?}, lives {}, money {}, {} enemies on the path, {} destroyed, {} escaped",
        snapshot.frame_counter,
        snapshot.play_state,
        snapshot.lives,
        snapshot.money,
        snapshot.enemies.len(),
        destroyed,
        escaped,
    );
}

fn run_windowed(args: &CliArgs, path: Vec<Coordinate>, simulation: Simulation) -> Result<()> {
    let config = LoopConfig {
        frame_wait: Duration::from_millis(args.frame_wait_ms),
    };
    let frame_loop = game_loop::spawn(simulation, config)?;
    let mut forwarder = InputForwarder::new(frame_loop.sender());
    let snapshots = frame_loop.snapshots();

    let backend = MacroquadBackend::new()
        .with_vsync(args.vsync)
        .with_show_fps(args.show_fps)
        .with_sprite_manifest(args.sprite_manifest.clone());
    let presentation = Presentation::new(WINDOW_TITLE, Color::WHITE, Scene::new(path));

    let result = backend.run(presentation, move |_dt, input, scene| {
        let pointer = BuilderInput::new(input.cursor_coordinate(), input.pointer_pressed);
        let _ = forwarder.forward(pointer);
        if let Some(snapshot) = game_loop::latest_snapshot(&snapshots) {
            snapshot.write_scene(scene);
        }
    });

    frame_loop.shutdown()?;
    log::info!("shut down");
    result
}
