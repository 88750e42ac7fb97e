#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Garden Defence adapters.
//!
//! Scenes are described in logical frame pixels: an 800x600 frame whose left
//! 600 pixels hold the garden and whose right 200 pixels hold the menu panel.
//! Backends scale the logical frame to whatever window they own.

use std::{str::FromStr, time::Duration};

use anyhow::Result as AnyResult;
use garden_defence_core::{
    Coordinate, EffectKind, EnemyKind, PlacementError, PlayState, TowerKind, FRAME_HEIGHT,
    FRAME_WIDTH,
};
use glam::Vec2;
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with a replaced alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self::new(self.red, self.green, self.blue, alpha)
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Size of the logical frame in pixels.
#[must_use]
pub fn frame_size() -> Vec2 {
    Vec2::new(FRAME_WIDTH as f32, FRAME_HEIGHT as f32)
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Cursor position in logical frame pixels, if the cursor is over the frame.
    pub cursor_position: Option<Vec2>,
    /// Whether the primary pointer button is held on this frame.
    pub pointer_pressed: bool,
}

impl FrameInput {
    /// Cursor position snapped to the integer pixel grid used by the simulation.
    #[must_use]
    pub fn cursor_coordinate(&self) -> Option<Coordinate> {
        self.cursor_position
            .map(|position| Coordinate::new(position.x.floor() as i32, position.y.floor() as i32))
    }
}

/// Keys identifying every image the game can draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpriteKey {
    /// Garden backdrop covering the play area.
    Backdrop,
    /// Overlay shown once the player runs out of lives.
    GameOver,
    /// Snail enemy.
    Snail,
    /// S-cargo enemy.
    SCargo,
    /// Salt shaker tower.
    Salt,
    /// Salt crystal effect.
    SaltCrystal,
}

impl SpriteKey {
    /// Every sprite key in canonical load order.
    pub const ALL: [Self; 6] = [
        Self::Backdrop,
        Self::GameOver,
        Self::Snail,
        Self::SCargo,
        Self::Salt,
        Self::SaltCrystal,
    ];

    /// Name used for the sprite inside manifests.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Backdrop => "Backdrop",
            Self::GameOver => "GameOver",
            Self::Snail => "Snail",
            Self::SCargo => "SCargo",
            Self::Salt => "Salt",
            Self::SaltCrystal => "SaltCrystal",
        }
    }

    /// Offset from the sprite's top-left corner to the point it is drawn at.
    #[must_use]
    pub fn anchor(self) -> Vec2 {
        match self {
            Self::Snail | Self::SCargo => Vec2::new(22.0, 19.0),
            Self::Salt => Vec2::new(25.0, 30.0),
            Self::Backdrop | Self::GameOver | Self::SaltCrystal => Vec2::ZERO,
        }
    }
}

impl FromStr for SpriteKey {
    type Err = RenderingError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == name)
            .ok_or_else(|| RenderingError::UnknownSprite {
                name: name.to_owned(),
            })
    }
}

impl From<EnemyKind> for SpriteKey {
    fn from(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Snail => Self::Snail,
            EnemyKind::SCargo => Self::SCargo,
        }
    }
}

impl From<TowerKind> for SpriteKey {
    fn from(kind: TowerKind) -> Self {
        match kind {
            TowerKind::Salt => Self::Salt,
        }
    }
}

impl From<EffectKind> for SpriteKey {
    fn from(kind: EffectKind) -> Self {
        match kind {
            EffectKind::SaltCrystal => Self::SaltCrystal,
        }
    }
}

/// Enemy drawn on the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneEnemy {
    /// Variant of the enemy.
    pub kind: EnemyKind,
    /// Current position in frame pixels.
    pub position: Coordinate,
}

/// Tower drawn in the garden.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneTower {
    /// Kind of tower.
    pub kind: TowerKind,
    /// Centre of the tower in frame pixels.
    pub position: Coordinate,
}

/// Live effect drawn above enemies and towers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneEffect {
    /// Variant of the effect.
    pub kind: EffectKind,
    /// Current position in frame pixels.
    pub position: Coordinate,
}

/// Ghost tower following the cursor while placement is armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerPreview {
    /// Kind of tower proposed for placement.
    pub kind: TowerKind,
    /// Position under the cursor.
    pub position: Coordinate,
    /// Reason the world would reject the placement, if any.
    pub rejection: Option<PlacementError>,
}

impl TowerPreview {
    /// Creates a new tower preview descriptor.
    #[must_use]
    pub const fn new(
        kind: TowerKind,
        position: Coordinate,
        rejection: Option<PlacementError>,
    ) -> Self {
        Self {
            kind,
            position,
            rejection,
        }
    }

    /// Indicates whether the preview location is valid for placement.
    #[must_use]
    pub const fn placeable(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Player resources shown in the menu panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hud {
    /// Lives left.
    pub lives: u32,
    /// Money available.
    pub money: u32,
}

impl Hud {
    /// Text line announcing the lives left.
    #[must_use]
    pub fn lives_label(&self) -> String {
        format!("Lives: {}", self.lives)
    }

    /// Text line announcing the money available.
    #[must_use]
    pub fn money_label(&self) -> String {
        format!("Money: {}", self.money)
    }
}

/// Scene description combining the garden path and its inhabitants.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Path polyline in frame pixels.
    pub path: Vec<Coordinate>,
    /// Enemies on the path in spawn order.
    pub enemies: Vec<SceneEnemy>,
    /// Towers placed in the garden.
    pub towers: Vec<SceneTower>,
    /// Live effects.
    pub effects: Vec<SceneEffect>,
    /// Ghost tower under the cursor while placement is armed.
    pub tower_preview: Option<TowerPreview>,
    /// Lives and money.
    pub hud: Hud,
    /// Whether the simulation is still running.
    pub play_state: PlayState,
}

impl Scene {
    /// Creates an empty scene around the provided path.
    #[must_use]
    pub fn new(path: Vec<Coordinate>) -> Self {
        Self {
            path,
            enemies: Vec::new(),
            towers: Vec::new(),
            effects: Vec::new(),
            tower_preview: None,
            hud: Hud::default(),
            play_state: PlayState::Running,
        }
    }

    /// Reports whether the game-over overlay should be shown.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.play_state == PlayState::GameOver
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Garden Defence scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the rendered frame delta
    /// and per-frame input captured by the adapter, and may replace the scene
    /// contents before they are drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when resolving rendering descriptors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RenderingError {
    /// A sprite name did not match any known sprite key.
    #[error("unknown sprite key `{name}`")]
    UnknownSprite {
        /// Name that failed to resolve.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighten_moves_channels_towards_white() {
        let color = Color::new(0.0, 0.5, 1.0, 0.25).lighten(0.5);
        assert_eq!(color, Color::new(0.5, 0.75, 1.0, 0.25));
    }

    #[test]
    fn cursor_coordinate_floors_sub_pixel_positions() {
        let input = FrameInput {
            cursor_position: Some(Vec2::new(12.9, 0.2)),
            pointer_pressed: true,
        };
        assert_eq!(input.cursor_coordinate(), Some(Coordinate::new(12, 0)));
        assert_eq!(FrameInput::default().cursor_coordinate(), None);
    }

    #[test]
    fn sprite_names_resolve_back_to_keys() {
        for key in SpriteKey::ALL {
            assert_eq!(key.name().parse::<SpriteKey>(), Ok(key));
        }
    }

    #[test]
    fn unknown_sprite_names_are_rejected() {
        assert_eq!(
            "Slug".parse::<SpriteKey>(),
            Err(RenderingError::UnknownSprite {
                name: "Slug".to_owned()
            })
        );
    }

    #[test]
    fn game_kinds_map_to_sprites_with_anchors() {
        assert_eq!(SpriteKey::from(EnemyKind::SCargo), SpriteKey::SCargo);
        assert_eq!(SpriteKey::from(TowerKind::Salt).anchor(), Vec2::new(25.0, 30.0));
        assert_eq!(SpriteKey::from(EffectKind::SaltCrystal).anchor(), Vec2::ZERO);
    }

    #[test]
    fn hud_labels_match_menu_text() {
        let hud = Hud {
            lives: 7,
            money: 200,
        };
        assert_eq!(hud.lives_label(), "Lives: 7");
        assert_eq!(hud.money_label(), "Money: 200");
    }

    #[test]
    fn new_scene_is_empty_and_running() {
        let scene = Scene::new(vec![Coordinate::new(0, 0), Coordinate::new(10, 0)]);
        assert!(scene.enemies.is_empty());
        assert!(scene.tower_preview.is_none());
        assert!(!scene.is_game_over());
        assert_eq!(frame_size(), Vec2::new(800.0, 600.0));
    }
}
