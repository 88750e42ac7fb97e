#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Garden Defence.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Scenes arrive in logical frame pixels. The adapter letterboxes the 800x600
//! frame into whatever window size the platform hands out and maps the cursor
//! back into frame pixels before reporting input.

mod sprites;

use anyhow::{Context, Result};
use garden_defence_core::{Coordinate, ScreenRect, MENU_PANEL, PLAY_AREA, TOWER_BUTTON};
use garden_defence_rendering::{
    frame_size, Color, FrameInput, Presentation, RenderingBackend, Scene, SceneEffect,
    SceneEnemy, SceneTower, SpriteKey, TowerPreview,
};
use glam::Vec2;
use macroquad::input::{
    is_key_pressed, is_mouse_button_down, mouse_position, KeyCode, MouseButton,
};
use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::mpsc,
    time::Duration,
};

use self::sprites::{DrawParams, SpriteAtlas};

const PATH_COLOR: Color = Color::new(1.0, 0.0, 1.0, 1.0);
const PATH_THICKNESS: f32 = 2.0;
const ENEMY_MARKER_COLOR: Color = Color::new(0.0, 1.0, 1.0, 1.0);
const TOWER_MARKER_COLOR: Color = Color::new(0.0, 1.0, 0.0, 1.0);
const MARKER_SIZE: f32 = 5.0;
const GARDEN_COLOR: Color = Color::new(0.36, 0.55, 0.25, 1.0);
const PANEL_COLOR: Color = Color::WHITE;
const BUTTON_COLOR: Color = Color::new(1.0, 1.0, 0.8, 1.0);
const HUD_TEXT_COLOR: Color = Color::BLACK;
const HUD_FONT_SIZE: f32 = 24.0;
const LIVES_LABEL_ORIGIN: Vec2 = Vec2::new(620.0, 100.0);
const MONEY_LABEL_ORIGIN: Vec2 = Vec2::new(620.0, 130.0);
const BUTTON_ICON_ORIGIN: Vec2 = Vec2::new(700.0, 300.0);
const PREVIEW_ALPHA: f32 = 0.6;
const REJECTED_PREVIEW_COLOR: Color = Color::new(1.0, 0.0, 0.0, 1.0);

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    sprite_manifest: Option<PathBuf>,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame rate metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Loads sprites from the manifest at `path` instead of drawing primitive shapes.
    #[must_use]
    pub fn with_sprite_manifest(mut self, path: Option<PathBuf>) -> Self {
        self.sprite_manifest = path;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            sprite_manifest,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let frame = frame_size();
        let mut config = macroquad::window::Conf {
            window_title,
            window_width: frame.x as i32,
            window_height: frame.y as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (atlas_init_sender, atlas_init_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let sprite_atlas = match sprite_manifest {
                Some(path) => {
                    match SpriteAtlas::from_manifest_path(&path)
                        .context("failed to initialise sprite atlas")
                    {
                        Ok(atlas) => {
                            log::info!(
                                "loaded {} sprites from {}",
                                atlas.texture_count(),
                                path.display()
                            );
                            Some(atlas)
                        }
                        Err(error) => {
                            let _ = atlas_init_sender.send(Err(error));
                            return;
                        }
                    }
                }
                None => None,
            };
            let _ = atlas_init_sender.send(Ok(()));

            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                if is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q) {
                    log::info!("quit requested from keyboard");
                    break;
                }

                macroquad::window::clear_background(background);

                let metrics = FrameMetrics::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = gather_frame_input(&metrics);

                update_scene(frame_dt, frame_input, &mut scene);

                draw_scene(&scene, &metrics, sprite_atlas.as_ref());

                if let Some(FpsMetrics {
                    per_second,
                    trailing_ten_seconds,
                }) = fps_counter.record_frame(frame_dt)
                {
                    if show_fps {
                        log::info!("FPS: {per_second:.2} (10s avg: {trailing_ten_seconds:.2})");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        atlas_init_receiver.recv().unwrap_or_else(|_| Ok(()))?;

        Ok(())
    }
}

/// Mapping between logical frame pixels and window pixels.
///
/// The frame is scaled uniformly to fit the window and centred on both axes.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameMetrics {
    scale: f32,
    offset: Vec2,
}

impl FrameMetrics {
    /// Computes the letterboxed placement of the frame inside a window.
    #[must_use]
    pub fn new(screen_width: f32, screen_height: f32) -> Self {
        let frame = frame_size();
        let scale = (screen_width / frame.x)
            .min(screen_height / frame.y)
            .max(0.0);
        let offset = Vec2::new(
            ((screen_width - frame.x * scale) * 0.5).max(0.0),
            ((screen_height - frame.y * scale) * 0.5).max(0.0),
        );
        Self { scale, offset }
    }

    /// Window pixels per frame pixel.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Converts a frame position into window pixels.
    #[must_use]
    pub fn to_screen(&self, position: Vec2) -> Vec2 {
        self.offset + position * self.scale
    }

    /// Converts a window position into frame pixels, if it lands inside the frame.
    #[must_use]
    pub fn to_frame(&self, screen: Vec2) -> Option<Vec2> {
        if self.scale <= f32::EPSILON {
            return None;
        }

        let position = (screen - self.offset) / self.scale;
        let frame = frame_size();
        let inside =
            position.x >= 0.0 && position.y >= 0.0 && position.x < frame.x && position.y < frame.y;
        inside.then_some(position)
    }

    fn coordinate(&self, position: Coordinate) -> Vec2 {
        self.to_screen(Vec2::new(position.x() as f32, position.y() as f32))
    }

    fn fill_rect(&self, rect: ScreenRect, color: Color) {
        let origin = self.coordinate(Coordinate::new(rect.left(), rect.top()));
        macroquad::shapes::draw_rectangle(
            origin.x,
            origin.y,
            rect.width() as f32 * self.scale,
            rect.height() as f32 * self.scale,
            to_macroquad_color(color),
        );
    }
}

fn gather_frame_input(metrics: &FrameMetrics) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    gather_frame_input_from_observations(
        metrics,
        Vec2::new(cursor_x, cursor_y),
        is_mouse_button_down(MouseButton::Left),
    )
}

fn gather_frame_input_from_observations(
    metrics: &FrameMetrics,
    cursor_position: Vec2,
    pointer_pressed: bool,
) -> FrameInput {
    let cursor_position = metrics.to_frame(cursor_position);
    FrameInput {
        cursor_position,
        pointer_pressed: pointer_pressed && cursor_position.is_some(),
    }
}

fn draw_scene(scene: &Scene, metrics: &FrameMetrics, atlas: Option<&SpriteAtlas>) {
    draw_backdrop(metrics, atlas);
    draw_path(&scene.path, metrics);
    draw_enemies(&scene.enemies, metrics, atlas);
    draw_towers(&scene.towers, metrics, atlas);
    if let Some(preview) = scene.tower_preview {
        draw_tower_preview(preview, metrics, atlas);
    }
    draw_effects(&scene.effects, metrics, atlas);

    // Overlay goes both under and over the menu panel.
    if scene.is_game_over() {
        draw_game_over(metrics, atlas);
    }
    draw_menu_panel(scene, metrics, atlas);
    if scene.is_game_over() {
        draw_game_over(metrics, atlas);
    }
}

fn draw_backdrop(metrics: &FrameMetrics, atlas: Option<&SpriteAtlas>) {
    let params = DrawParams::new(metrics.to_screen(Vec2::ZERO), metrics.scale());
    draw_sprite_or_else(atlas, SpriteKey::Backdrop, params, || {
        metrics.fill_rect(PLAY_AREA, GARDEN_COLOR);
    });
}

fn draw_path(path: &[Coordinate], metrics: &FrameMetrics) {
    let color = to_macroquad_color(PATH_COLOR);
    let thickness = PATH_THICKNESS * metrics.scale();
    for segment in path.windows(2) {
        let from = metrics.coordinate(segment[0]);
        let to = metrics.coordinate(segment[1]);
        macroquad::shapes::draw_line(from.x, from.y, to.x, to.y, thickness, color);
    }
}

fn draw_enemies(enemies: &[SceneEnemy], metrics: &FrameMetrics, atlas: Option<&SpriteAtlas>) {
    for enemy in enemies {
        let anchor = metrics.coordinate(enemy.position);
        let key = SpriteKey::from(enemy.kind);
        draw_sprite_or_else(atlas, key, DrawParams::new(anchor, metrics.scale()), || {
            draw_primitive_enemy(key, anchor, metrics.scale());
        });
        draw_marker(anchor, ENEMY_MARKER_COLOR, metrics.scale());
    }
}

fn draw_primitive_enemy(key: SpriteKey, anchor: Vec2, scale: f32) {
    let (shell, body) = match key {
        SpriteKey::SCargo => (Color::from_rgb_u8(120, 72, 40), Color::from_rgb_u8(200, 170, 120)),
        _ => (Color::from_rgb_u8(176, 112, 48), Color::from_rgb_u8(224, 200, 140)),
    };
    let half = key.anchor() * scale;
    macroquad::shapes::draw_rectangle(
        anchor.x - half.x,
        anchor.y + half.y * 0.2,
        half.x * 2.0,
        half.y * 0.6,
        to_macroquad_color(body),
    );
    macroquad::shapes::draw_circle(anchor.x, anchor.y, half.y * 0.8, to_macroquad_color(shell));
}

fn draw_towers(towers: &[SceneTower], metrics: &FrameMetrics, atlas: Option<&SpriteAtlas>) {
    for tower in towers {
        let anchor = metrics.coordinate(tower.position);
        let key = SpriteKey::from(tower.kind);
        draw_sprite_or_else(atlas, key, DrawParams::new(anchor, metrics.scale()), || {
            draw_primitive_tower(key, anchor, metrics.scale(), Color::WHITE);
        });
        draw_marker(anchor, TOWER_MARKER_COLOR, metrics.scale());
    }
}

fn draw_primitive_tower(key: SpriteKey, anchor: Vec2, scale: f32, tint: Color) {
    let half = key.anchor() * scale;
    let body = Color::from_rgb_u8(230, 230, 236);
    let cap = Color::from_rgb_u8(150, 150, 160);
    let tinted = |color: Color| {
        to_macroquad_color(Color::new(
            color.red * tint.red,
            color.green * tint.green,
            color.blue * tint.blue,
            color.alpha * tint.alpha,
        ))
    };
    macroquad::shapes::draw_rectangle(
        anchor.x - half.x,
        anchor.y - half.y * 0.4,
        half.x * 2.0,
        half.y * 1.4,
        tinted(body),
    );
    macroquad::shapes::draw_rectangle(
        anchor.x - half.x * 0.8,
        anchor.y - half.y,
        half.x * 1.6,
        half.y * 0.6,
        tinted(cap),
    );
}

fn draw_tower_preview(preview: TowerPreview, metrics: &FrameMetrics, atlas: Option<&SpriteAtlas>) {
    let anchor = metrics.coordinate(preview.position);
    let key = SpriteKey::from(preview.kind);
    let tint = preview_tint(&preview);
    let params = DrawParams::new(anchor, metrics.scale()).with_tint(tint);
    draw_sprite_or_else(atlas, key, params, || {
        draw_primitive_tower(key, anchor, metrics.scale(), tint);
    });
}

fn preview_tint(preview: &TowerPreview) -> Color {
    if preview.placeable() {
        Color::WHITE.with_alpha(PREVIEW_ALPHA)
    } else {
        REJECTED_PREVIEW_COLOR
            .lighten(0.35)
            .with_alpha(PREVIEW_ALPHA)
    }
}

fn draw_effects(effects: &[SceneEffect], metrics: &FrameMetrics, atlas: Option<&SpriteAtlas>) {
    for effect in effects {
        let origin = metrics.coordinate(effect.position);
        let key = SpriteKey::from(effect.kind);
        draw_sprite_or_else(atlas, key, DrawParams::new(origin, metrics.scale()), || {
            let size = 8.0 * metrics.scale();
            macroquad::shapes::draw_rectangle(
                origin.x,
                origin.y,
                size,
                size,
                to_macroquad_color(Color::from_rgb_u8(245, 245, 255)),
            );
        });
    }
}

fn draw_game_over(metrics: &FrameMetrics, atlas: Option<&SpriteAtlas>) {
    let params = DrawParams::new(metrics.to_screen(Vec2::ZERO), metrics.scale());
    draw_sprite_or_else(atlas, SpriteKey::GameOver, params, || {
        metrics.fill_rect(PLAY_AREA, Color::BLACK.with_alpha(0.6));
        let origin = metrics.to_screen(Vec2::new(190.0, 310.0));
        let _ = macroquad::text::draw_text(
            "GAME OVER",
            origin.x,
            origin.y,
            48.0 * metrics.scale(),
            to_macroquad_color(Color::WHITE),
        );
    });
}

fn draw_menu_panel(scene: &Scene, metrics: &FrameMetrics, atlas: Option<&SpriteAtlas>) {
    metrics.fill_rect(MENU_PANEL, PANEL_COLOR);
    metrics.fill_rect(TOWER_BUTTON, BUTTON_COLOR);

    let icon = metrics.to_screen(BUTTON_ICON_ORIGIN);
    draw_sprite_or_else(
        atlas,
        SpriteKey::Salt,
        DrawParams::new(icon, metrics.scale()),
        || draw_primitive_tower(SpriteKey::Salt, icon, metrics.scale(), Color::WHITE),
    );

    draw_hud_label(&scene.hud.lives_label(), LIVES_LABEL_ORIGIN, metrics);
    draw_hud_label(&scene.hud.money_label(), MONEY_LABEL_ORIGIN, metrics);
}

fn draw_hud_label(text: &str, origin: Vec2, metrics: &FrameMetrics) {
    let origin = metrics.to_screen(origin);
    let _ = macroquad::text::draw_text(
        text,
        origin.x,
        origin.y,
        HUD_FONT_SIZE * metrics.scale(),
        to_macroquad_color(HUD_TEXT_COLOR),
    );
}

fn draw_marker(center: Vec2, color: Color, scale: f32) {
    macroquad::shapes::draw_circle(
        center.x,
        center.y,
        MARKER_SIZE * 0.5 * scale,
        to_macroquad_color(color),
    );
}

fn draw_sprite_or_else(
    atlas: Option<&SpriteAtlas>,
    key: SpriteKey,
    params: DrawParams,
    fallback: impl FnOnce(),
) {
    let Some(atlas) = atlas else {
        fallback();
        return;
    };
    if let Err(error) = atlas.draw(key, params) {
        log::warn!("{error:#}");
        fallback();
    }
}

#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<FpsMetrics> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);

        self.frame_times.push_back(frame);
        self.window_duration += frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            let Some(removed) = self.frame_times.pop_front() else {
                break;
            };
            self.window_duration = self.window_duration.saturating_sub(removed);
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(FpsMetrics {
            per_second,
            trailing_ten_seconds,
        })
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_defence_core::{PlacementError, TowerKind};

    fn assert_vec2_close(actual: Vec2, expected: Vec2) {
        let delta = (actual - expected).abs();
        assert!(
            delta.x <= 1e-4 && delta.y <= 1e-4,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn native_window_maps_frame_pixels_one_to_one() {
        let metrics = FrameMetrics::new(800.0, 600.0);

        assert_eq!(metrics.scale(), 1.0);
        assert_vec2_close(metrics.to_screen(Vec2::new(620.0, 100.0)), Vec2::new(620.0, 100.0));
    }

    #[test]
    fn wide_windows_are_pillarboxed() {
        let metrics = FrameMetrics::new(1600.0, 900.0);

        assert_eq!(metrics.scale(), 1.5);
        assert_vec2_close(metrics.to_screen(Vec2::ZERO), Vec2::new(200.0, 0.0));
        assert_vec2_close(
            metrics.to_frame(Vec2::new(1100.0, 450.0)).expect("inside frame"),
            Vec2::new(600.0, 300.0),
        );
        assert_eq!(metrics.to_frame(Vec2::new(150.0, 450.0)), None);
    }

    #[test]
    fn cursor_outside_frame_reports_no_position_or_press() {
        let metrics = FrameMetrics::new(1000.0, 600.0);

        let outside = gather_frame_input_from_observations(&metrics, Vec2::new(50.0, 10.0), true);
        assert_eq!(outside, FrameInput::default());

        let inside = gather_frame_input_from_observations(&metrics, Vec2::new(800.0, 300.0), true);
        assert_eq!(inside.cursor_position, Some(Vec2::new(700.0, 300.0)));
        assert!(inside.pointer_pressed);
    }

    #[test]
    fn degenerate_windows_never_report_a_cursor() {
        let metrics = FrameMetrics::new(0.0, 0.0);

        assert_eq!(metrics.to_frame(Vec2::ZERO), None);
    }

    #[test]
    fn rejected_previews_are_tinted() {
        let position = Coordinate::new(300, 300);
        let rejected = TowerPreview::new(
            TowerKind::Salt,
            position,
            Some(PlacementError::TooCloseToPath),
        );
        let accepted = TowerPreview::new(TowerKind::Salt, position, None);

        assert_eq!(preview_tint(&rejected), Color::new(1.0, 0.35, 0.35, 0.6));
        assert_eq!(preview_tint(&accepted), Color::new(1.0, 1.0, 1.0, 0.6));
    }

    #[test]
    fn fps_counter_reports_average_frames_per_second() {
        let mut counter = FpsCounter::default();
        let frame = Duration::from_millis(250);
        assert!(counter.record_frame(frame).is_none());
        assert!(counter.record_frame(frame).is_none());
        assert!(counter.record_frame(frame).is_none());

        let metrics = counter
            .record_frame(frame)
            .expect("should report FPS after one second of samples");
        assert!((metrics.per_second - 4.0).abs() <= 1e-3);
        assert!((metrics.trailing_ten_seconds - 4.0).abs() <= 1e-3);
        assert!(counter.record_frame(frame).is_none());
    }

    #[test]
    fn fps_counter_tracks_trailing_ten_second_average() {
        let mut counter = FpsCounter::default();

        for _ in 0..10 {
            for sample in 0..5 {
                let metrics = counter.record_frame(Duration::from_millis(200));
                if sample == 4 {
                    let metrics = metrics.expect("should report every second");
                    assert!((metrics.per_second - 5.0).abs() <= 1e-3);
                    assert!((metrics.trailing_ten_seconds - 5.0).abs() <= 1e-3);
                } else {
                    assert!(metrics.is_none());
                }
            }
        }

        for sample in 0..10 {
            let metrics = counter.record_frame(Duration::from_millis(100));
            if sample == 9 {
                let metrics = metrics.expect("should report every second");
                assert!((metrics.per_second - 10.0).abs() <= 1e-3);
                assert!((metrics.trailing_ten_seconds - 5.5).abs() <= 1e-3);
            } else {
                assert!(metrics.is_none());
            }
        }
    }
}
