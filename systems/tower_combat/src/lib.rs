#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits effect firing commands from targeting data.

use garden_defence_core::{Command, PlayState, TowerTarget, TowerView};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireEffect` entries for towers whose cooldown elapsed.
    ///
    /// The effect is aimed at the target's position shifted by the tower's
    /// aim offset.
    pub fn handle(
        &mut self,
        play_state: PlayState,
        towers: &TowerView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if play_state != PlayState::Running || tower_targets.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            let Some(snapshot) = towers.get(target.tower) else {
                continue;
            };
            if !snapshot.is_ready() {
                continue;
            }

            let (dx, dy) = snapshot.kind.aim_offset();
            self.scratch.push(Command::FireEffect {
                tower: target.tower,
                target: target.enemy_position.offset(dx, dy),
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
