use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use garden_defence_rendering::{Color, SpriteKey};
use glam::Vec2;
use macroquad::{
    math::Vec2 as MacroquadVec2,
    texture::{self, DrawTextureParams, Texture2D},
};

use crate::to_macroquad_color;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Parameters describing how a sprite should be drawn on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DrawParams {
    /// Screen-space position of the sprite's anchor point.
    pub(crate) anchor: Vec2,
    /// Uniform scale from frame pixels to screen pixels.
    pub(crate) scale: f32,
    /// Tint applied to the sprite.
    pub(crate) tint: Color,
}

impl DrawParams {
    /// Creates draw parameters anchored at the provided screen position.
    #[must_use]
    pub(crate) fn new(anchor: Vec2, scale: f32) -> Self {
        Self {
            anchor,
            scale,
            tint: Color::WHITE,
        }
    }

    /// Overrides the tint colour used when drawing the sprite.
    #[must_use]
    pub(crate) fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }
}

/// Cache of textures loaded from the sprite manifest.
#[derive(Debug)]
pub(crate) struct SpriteAtlas {
    textures: HashMap<SpriteKey, Texture2D>,
}

impl SpriteAtlas {
    /// Loads sprites from the manifest located at the provided path.
    pub(crate) fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_manifest_with_loader(path, default_loader)
    }

    /// Draws the requested sprite so its anchor lands on `params.anchor`.
    pub(crate) fn draw(&self, key: SpriteKey, params: DrawParams) -> Result<()> {
        let texture = *self
            .textures
            .get(&key)
            .with_context(|| format!("sprite {key:?} missing from atlas"))?;

        let (position, dest_size) = sprite_placement(
            key,
            params,
            MacroquadVec2::new(texture.width(), texture.height()),
        );
        let draw_params = DrawTextureParams {
            dest_size: Some(dest_size),
            ..DrawTextureParams::default()
        };

        texture::draw_texture_ex(
            texture,
            position.x,
            position.y,
            to_macroquad_color(params.tint),
            draw_params,
        );

        Ok(())
    }

    /// Returns the number of textures stored in the atlas.
    #[must_use]
    pub(crate) fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn from_manifest_with_loader(
        path: impl AsRef<Path>,
        mut loader: impl FnMut(SpriteKey, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read sprite manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = parse_manifest(&contents, &base)?;
        Self::from_entries(entries, &mut loader)
    }

    fn from_entries(
        entries: Vec<(SpriteKey, PathBuf)>,
        loader: &mut impl FnMut(SpriteKey, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let mut textures = HashMap::with_capacity(entries.len());
        for (key, path) in entries {
            let texture = loader(key, &path).with_context(|| {
                format!("failed to load sprite {key:?} from {}", path.display())
            })?;
            if textures.insert(key, texture).is_some() {
                bail!("duplicate sprite entry for {key:?}");
            }
        }
        Ok(Self { textures })
    }
}

/// Top-left corner and destination size of a sprite drawn at `params`.
fn sprite_placement(
    key: SpriteKey,
    params: DrawParams,
    texture_size: MacroquadVec2,
) -> (MacroquadVec2, MacroquadVec2) {
    let anchor = key.anchor() * params.scale;
    let position = MacroquadVec2::new(params.anchor.x - anchor.x, params.anchor.y - anchor.y);
    let dest_size = texture_size * params.scale;
    (position, dest_size)
}

fn default_loader(_key: SpriteKey, path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read sprite asset at {}", path.display()))?;
    Ok(Texture2D::from_file_with_format(&bytes, None))
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    sprites: HashMap<String, String>,
}

fn parse_manifest(contents: &str, base_path: &Path) -> Result<Vec<(SpriteKey, PathBuf)>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse sprite manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported sprite manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut resolved = HashMap::new();
    for (name, relative_path) in manifest.sprites {
        let key: SpriteKey = name
            .parse()
            .with_context(|| format!("invalid entry `{name}` in sprite manifest"))?;
        let path = base_path.join(relative_path);
        if resolved.insert(key, path).is_some() {
            bail!("sprite manifest contains duplicate entry for {key:?}");
        }
    }

    let mut ordered = Vec::with_capacity(SpriteKey::ALL.len());
    for key in SpriteKey::ALL {
        let Some(path) = resolved.remove(&key) else {
            bail!("sprite manifest missing entry for {}", key.name());
        };
        ordered.push((key, path));
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const FULL_MANIFEST: &str = r#"
        version = 1

        [sprites]
        SaltCrystal = "salt_crystals.png"
        Salt = "salt.png"
        SCargo = "s-cargo.png"
        Snail = "snail.png"
        GameOver = "game_over.png"
        Backdrop = "path_2.jpg"
    "#;

    #[test]
    fn parse_manifest_requires_all_known_keys() {
        let manifest = r#"
            version = 1

            [sprites]
            Backdrop = "path_2.jpg"
            Snail = "snail.png"
        "#;

        let error = parse_manifest(manifest, Path::new("assets")).expect_err("incomplete");
        assert!(error.to_string().contains("GameOver"));
    }

    #[test]
    fn manifest_rejects_unknown_keys() {
        let manifest = format!("{FULL_MANIFEST}\n        Slug = \"slug.png\"\n");

        let result = parse_manifest(&manifest, Path::new("assets"));
        assert!(result.is_err(), "unknown keys must be rejected");
    }

    #[test]
    fn manifest_rejects_other_versions() {
        let manifest = FULL_MANIFEST.replace("version = 1", "version = 2");

        let result = parse_manifest(&manifest, Path::new("assets"));
        assert!(result.is_err());
    }

    #[test]
    fn manifest_resolves_paths_relative_to_base_directory() {
        let parsed = parse_manifest(FULL_MANIFEST, Path::new("root")).expect("manifest parses");

        assert_eq!(
            parsed.iter().map(|(key, _)| *key).collect::<Vec<_>>(),
            SpriteKey::ALL.to_vec()
        );
        assert_eq!(parsed[2], (SpriteKey::Snail, PathBuf::from("root/snail.png")));
    }

    #[test]
    fn atlas_loads_every_texture_once_in_canonical_order() {
        let entries = parse_manifest(FULL_MANIFEST, Path::new("assets")).expect("manifest parses");
        let load_order = RefCell::new(Vec::new());
        let atlas = SpriteAtlas::from_entries(entries, &mut |key, _| {
            load_order.borrow_mut().push(key);
            Ok(Texture2D::empty())
        })
        .expect("atlas should load using provided loader");

        assert_eq!(load_order.borrow().as_slice(), &SpriteKey::ALL);
        assert_eq!(atlas.texture_count(), SpriteKey::ALL.len());
    }

    #[test]
    fn loader_failures_name_the_sprite() {
        let entries = vec![(SpriteKey::Snail, PathBuf::from("snail.png"))];
        let error = SpriteAtlas::from_entries(entries, &mut |_, _| bail!("corrupt image"))
            .expect_err("loader failure propagates");

        assert!(error.to_string().contains("Snail"));
    }

    #[test]
    fn sprite_placement_offsets_by_scaled_anchor() {
        let params = DrawParams::new(Vec2::new(200.0, 100.0), 2.0);

        let (position, size) =
            sprite_placement(SpriteKey::Snail, params, MacroquadVec2::new(44.0, 38.0));

        assert_eq!(position, MacroquadVec2::new(156.0, 62.0));
        assert_eq!(size, MacroquadVec2::new(88.0, 76.0));
    }
}
