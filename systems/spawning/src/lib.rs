#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scripted spawning system responsible for emitting enemy spawn commands.
//!
//! The spawn script is a string of single-character steps: `s` spawns a
//! snail, `v` spawns an s-cargo, and a digit pauses the generator for that
//! many tenths of a second. The script repeats forever.

use garden_defence_core::{Command, EnemyKind, Event, PlayState};
use thiserror::Error;

/// Script used when no explicit configuration is supplied.
pub const DEFAULT_SCRIPT: &str = "s9v9s99s99s1s1s1s7s8s7ssss9s9s9s9s6s7s8";

/// Delay units elapsed per simulated second.
const DELAY_UNITS_PER_SECOND: f64 = 10.0;

/// Errors raised while validating a spawn script.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SpawnScriptError {
    /// The script contains no steps.
    #[error("spawn script is empty")]
    Empty,
    /// The script contains a character that is neither a spawn nor a delay.
    #[error("unknown spawn step `{symbol}` at position {index}")]
    UnknownStep {
        /// Zero-based character position.
        index: usize,
        /// Offending character.
        symbol: char,
    },
}

/// Single instruction consumed from the spawn script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptStep {
    /// Introduce an enemy at the start of the path.
    Spawn(EnemyKind),
    /// Pause for the given number of tenths of a second.
    Delay(u8),
}

impl ScriptStep {
    fn parse(symbol: char) -> Option<Self> {
        match symbol {
            's' => Some(Self::Spawn(EnemyKind::Snail)),
            'v' => Some(Self::Spawn(EnemyKind::SCargo)),
            digit => digit.to_digit(10).map(|tenths| Self::Delay(tenths as u8)),
        }
    }
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    steps: Vec<ScriptStep>,
}

impl Config {
    /// Validates the provided script and captures its steps.
    pub fn new(script: &str) -> Result<Self, SpawnScriptError> {
        let steps = script
            .chars()
            .enumerate()
            .map(|(index, symbol)| {
                ScriptStep::parse(symbol).ok_or(SpawnScriptError::UnknownStep { index, symbol })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if steps.is_empty() {
            return Err(SpawnScriptError::Empty);
        }

        Ok(Self { steps })
    }

    /// Steps parsed from the script in playback order.
    #[must_use]
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steps: DEFAULT_SCRIPT.chars().filter_map(ScriptStep::parse).collect(),
        }
    }
}

/// Pure system that replays the spawn script as simulated time passes.
#[derive(Debug)]
pub struct Spawning {
    steps: Vec<ScriptStep>,
    cursor: usize,
    pending_delay: f64,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            steps: config.steps,
            cursor: 0,
            pending_delay: 0.0,
        }
    }

    /// Index of the next step that will be consumed.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Consumes events to emit spawn commands.
    ///
    /// At most one script step is consumed per call, and only on frames where
    /// the world reported that time advanced.
    pub fn handle(&mut self, events: &[Event], play_state: PlayState, out: &mut Vec<Command>) {
        if play_state != PlayState::Running {
            return;
        }

        let mut advanced = false;
        let mut elapsed = 0.0;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                advanced = true;
                elapsed += dt.as_secs_f64();
            }
        }

        if !advanced {
            return;
        }

        self.pending_delay -= elapsed * DELAY_UNITS_PER_SECOND;
        if self.pending_delay > 0.0 {
            return;
        }

        match self.next_step() {
            ScriptStep::Spawn(kind) => out.push(Command::SpawnEnemy { kind }),
            ScriptStep::Delay(tenths) => self.pending_delay = f64::from(tenths),
        }
    }

    fn next_step(&mut self) -> ScriptStep {
        let step = self.steps[self.cursor];
        self.cursor = (self.cursor + 1) % self.steps.len();
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_built_in_script() {
        let config = Config::default();
        assert_eq!(config, Config::new(DEFAULT_SCRIPT).expect("valid script"));
        assert_eq!(config.steps().len(), DEFAULT_SCRIPT.len());
    }

    #[test]
    fn parse_maps_symbols_to_steps() {
        let config = Config::new("sv0").expect("valid script");
        assert_eq!(
            config.steps(),
            &[
                ScriptStep::Spawn(EnemyKind::Snail),
                ScriptStep::Spawn(EnemyKind::SCargo),
                ScriptStep::Delay(0),
            ]
        );
    }

    #[test]
    fn invalid_scripts_are_rejected() {
        assert_eq!(Config::new(""), Err(SpawnScriptError::Empty));
        assert_eq!(
            Config::new("s9x"),
            Err(SpawnScriptError::UnknownStep {
                index: 2,
                symbol: 'x'
            })
        );
    }
}
