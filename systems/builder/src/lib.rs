#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure builder system responsible for arming the tower button and emitting
//! tower placement commands.

use garden_defence_core::{
    Command, Coordinate, Event, PlacementPreview, PlayState, TowerKind, TOWER_BUTTON,
};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Pointer position in frame pixels, if the pointer is over the frame.
    pub pointer: Option<Coordinate>,
    /// Indicates whether the pointer button is held on this frame.
    pub pressed: bool,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(pointer: Option<Coordinate>, pressed: bool) -> Self {
        Self { pointer, pressed }
    }

    fn press(&self) -> Option<Coordinate> {
        if self.pressed {
            self.pointer
        } else {
            None
        }
    }
}

/// Builder system that translates menu presses and previews into placement commands.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    placing: Option<TowerKind>,
}

impl Builder {
    /// Creates a new builder system instance with placement disarmed.
    #[must_use]
    pub const fn new() -> Self {
        Self { placing: None }
    }

    /// Tower kind awaiting placement, if the player armed the button.
    #[must_use]
    pub const fn placing(&self) -> Option<TowerKind> {
        self.placing
    }

    /// Consumes world events and adapter-derived input to emit builder commands.
    ///
    /// `preview` should mirror the world's `query::placement_preview` for the
    /// pointer position and the armed tower kind.
    pub fn handle(
        &mut self,
        events: &[Event],
        play_state: PlayState,
        input: BuilderInput,
        money: u32,
        preview: Option<PlacementPreview>,
        out: &mut Vec<Command>,
    ) {
        if events.iter().any(|event| matches!(event, Event::GameOver))
            || play_state != PlayState::Running
        {
            self.placing = None;
            return;
        }

        let Some(point) = input.press() else {
            return;
        };

        let kind = TowerKind::Salt;
        if TOWER_BUTTON.contains(point) {
            if money > kind.cost() {
                self.placing = Some(kind);
            }
            return;
        }

        let Some(armed) = self.placing else {
            return;
        };

        if let Some(preview) = preview {
            if preview.kind == armed && preview.position == point && preview.placeable() {
                out.push(Command::PlaceTower {
                    kind: armed,
                    position: point,
                });
                self.placing = None;
            }
        }
    }
}
