#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the Garden Defence experience.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use garden_defence_world::{query, PathError, PathPoints, World};

/// Garden path compiled into the binary and used when no file is supplied.
pub const GARDEN_PATH: &str = include_str!("../../../resources/garden_path.txt");

/// Produces the world and the data required to greet the player.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Parses the built-in garden path.
    pub fn default_path(&self) -> Result<PathPoints, PathError> {
        PathPoints::parse(GARDEN_PATH)
    }

    /// Reads and parses a path definition from disk.
    pub fn load_path(&self, file: &Path) -> Result<PathPoints> {
        let definition = fs::read_to_string(file)
            .with_context(|| format!("failed to read path file {}", file.display()))?;
        PathPoints::parse(&definition)
            .with_context(|| format!("failed to parse path file {}", file.display()))
    }

    /// Creates a fresh world from the optional path file, falling back to the
    /// built-in garden path.
    pub fn world(&self, file: Option<&Path>) -> Result<World> {
        let path = match file {
            Some(file) => self.load_path(file)?,
            None => self
                .default_path()
                .context("built-in garden path is malformed")?,
        };
        log::info!(
            "garden path has {} points spanning {:.0} px",
            path.points().len(),
            path.total_length()
        );
        Ok(World::new(path))
    }
}
