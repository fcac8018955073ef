//! Sprite atlas manager.
//!
//! Registration marks the atlas dirty; every read that depends on atlas
//! contents repacks first if needed. A rebuild produces a complete new
//! atlas which replaces the old one only after packing succeeded.

use crate::atlas::{self, Atlas, AtlasEntry, OverflowPolicy};
use crate::backend::GraphicsBackend;
use crate::batch::{BatchInstance, SpriteBatch};
use crate::error::{AtlasError, Result};
use crate::normalize;
use crate::registry::{Sprite, SpriteRegistry};
use crate::types::{DrawParams, Metadata, Rect};
use image::ImageFormat;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Tolerance for matching packed positions against grid lines.
const GRID_TOLERANCE: f32 = 1e-3;

/// Atlas manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Tile size used for row/column queries.
    pub default_tile_size: u32,
    /// Side of the square atlas texture.
    pub atlas_size: u32,
    /// Normalize every sprite to `default_tile_size` instead of picking a
    /// size from the source dimensions.
    pub enforce_tile_size: bool,
    /// Handling of sprites that do not fit.
    pub overflow: OverflowPolicy,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            default_tile_size: 16,
            atlas_size: 512,
            enforce_tile_size: false,
            overflow: OverflowPolicy::Reject,
        }
    }
}

impl AtlasConfig {
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.default_tile_size = tile_size;
        self
    }

    pub fn with_atlas_size(mut self, atlas_size: u32) -> Self {
        self.atlas_size = atlas_size;
        self
    }

    pub fn with_enforced_tile_size(mut self, enforce: bool) -> Self {
        self.enforce_tile_size = enforce;
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }
}

/// Whether the atlas reflects the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebuildState {
    Clean,
    Dirty,
}

/// Result of [`AtlasManager::get`].
#[derive(Debug)]
pub struct SpriteView<'a, I> {
    /// Current atlas, if any sprite was ever packed.
    pub atlas: Option<&'a Atlas<I>>,
    /// UV entry of the sprite, `None` for unknown ids.
    pub uv: Option<&'a AtlasEntry>,
    /// Sprite metadata, `None` for unknown ids.
    pub metadata: Option<&'a Metadata>,
}

/// A manager shared across threads behind a single lock.
pub type SharedAtlasManager<B> = Arc<Mutex<AtlasManager<B>>>;

/// Owns the sprites, the atlas and the backend used to build and draw it.
pub struct AtlasManager<B: GraphicsBackend> {
    backend: B,
    base_path: PathBuf,
    config: AtlasConfig,
    registry: SpriteRegistry<B::Image>,
    atlas: Option<Atlas<B::Image>>,
    built_generation: u64,
}

impl<B: GraphicsBackend> AtlasManager<B> {
    /// Create a manager resolving relative sprite files against `base_path`.
    pub fn new(backend: B, base_path: impl Into<PathBuf>, config: AtlasConfig) -> Self {
        let registry = SpriteRegistry::new();
        let built_generation = registry.generation();
        Self {
            backend,
            base_path: base_path.into(),
            config,
            registry,
            atlas: None,
            built_generation,
        }
    }

    /// Create a manager with default configuration and no base path.
    pub fn with_backend(backend: B) -> Self {
        Self::new(backend, PathBuf::new(), AtlasConfig::default())
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Wrap the manager for use from several threads.
    pub fn into_shared(self) -> SharedAtlasManager<B> {
        Arc::new(Mutex::new(self))
    }

    /// Load a sprite file relative to the base path.
    ///
    /// A file name without extension gets `.png`.
    pub fn add(&mut self, file: impl AsRef<Path>, custom_id: Option<&str>) -> Result<String> {
        let mut path = self.base_path.join(file);
        if path.extension().is_none() {
            path.set_extension("png");
        }
        self.add_from_path(path, custom_id)
    }

    /// Load a sprite from a full path. The id defaults to the file stem.
    pub fn add_from_path(&mut self, path: impl AsRef<Path>, custom_id: Option<&str>) -> Result<String> {
        let path = path.as_ref();
        let image = self.backend.load_image(path)?;

        let id = match custom_id {
            Some(id) => id.to_string(),
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .ok_or_else(|| AtlasError::NotFound(path.to_path_buf()))?,
        };

        self.add_image(id, image, None)
    }

    /// Decode and register an in-memory encoded image.
    pub fn add_bytes(&mut self, id: impl Into<String>, bytes: &[u8], metadata: Option<Metadata>) -> Result<String> {
        let image = self.backend.decode_image(bytes)?;
        self.add_image(id, image, metadata)
    }

    /// Normalize and register a decoded image. Replaces any sprite with the same id.
    pub fn add_image(&mut self, id: impl Into<String>, image: B::Image, metadata: Option<Metadata>) -> Result<String> {
        let id = id.into();
        let source_size = self.backend.image_size(&image);
        let size = if self.config.enforce_tile_size {
            self.config.default_tile_size
        } else {
            normalize::tile_size_for(source_size.0, source_size.1)
        };
        self.check_capacity(&id, size)?;

        let image = normalize::normalize(&mut self.backend, image, size)?;
        debug!(
            "registered sprite '{}' ({}x{} -> {}px tile)",
            id, source_size.0, source_size.1, size
        );

        let sprite = Sprite::new(id, image, size, source_size).with_metadata(metadata.unwrap_or_default());
        Ok(self.registry.register(sprite))
    }

    /// Reject a registration that would push the layout past the atlas edge.
    ///
    /// Runs before the registry changes, so a rejected sprite leaves the
    /// current atlas and its state untouched.
    fn check_capacity(&self, id: &str, size: u32) -> Result<()> {
        if self.config.overflow == OverflowPolicy::Clip {
            return Ok(());
        }

        let mut sizes: Vec<(&str, u32)> = self
            .registry
            .iter()
            .map(|sprite| {
                if sprite.id == id {
                    (id, size)
                } else {
                    (sprite.id.as_str(), sprite.size)
                }
            })
            .collect();
        if !self.registry.contains(id) {
            sizes.push((id, size));
        }

        let atlas_size = self.config.atlas_size;
        let placements = atlas::shelf_layout(sizes.iter().map(|&(_, side)| (side, side)), atlas_size);
        match sizes
            .iter()
            .zip(&placements)
            .find(|(_, placement)| !placement.fits(atlas_size))
        {
            Some((&(overflowing, _), placement)) => Err(AtlasError::CapacityExceeded {
                id: overflowing.to_string(),
                x: placement.x,
                y: placement.y,
                width: placement.width,
                height: placement.height,
                atlas_size,
            }),
            None => Ok(()),
        }
    }

    /// Replace a sprite's metadata. Returns false, and changes nothing, for unknown ids.
    pub fn set_metadata(&mut self, id: &str, metadata: Metadata) -> bool {
        self.registry.set_metadata(id, metadata)
    }

    pub fn get_metadata(&self, id: &str) -> Option<&Metadata> {
        self.registry.get_metadata(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// Registered ids in packing order.
    pub fn sprite_ids(&self) -> Vec<String> {
        self.registry.ids().map(str::to_string).collect()
    }

    pub fn sprite(&self, id: &str) -> Option<&Sprite<B::Image>> {
        self.registry.get(id)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn state(&self) -> RebuildState {
        if self.registry.generation() == self.built_generation {
            RebuildState::Clean
        } else {
            RebuildState::Dirty
        }
    }

    /// Repack every sprite now, regardless of state.
    pub fn rebuild(&mut self) -> Result<()> {
        let atlas = atlas::pack(
            &mut self.backend,
            &self.registry,
            self.config.atlas_size,
            self.config.overflow,
        )?;
        debug!(
            "rebuilt {}px atlas with {} sprites",
            atlas.size(),
            atlas.len()
        );

        self.built_generation = atlas.generation();
        self.atlas = Some(atlas);
        Ok(())
    }

    fn ensure_built(&mut self) -> Result<()> {
        if self.state() == RebuildState::Dirty {
            self.rebuild()?;
        }
        Ok(())
    }

    /// Current atlas, rebuilt first if stale.
    pub fn atlas(&mut self) -> Result<Option<&Atlas<B::Image>>> {
        self.ensure_built()?;
        Ok(self.atlas.as_ref())
    }

    /// Look up a sprite. Unknown ids yield empty `uv` and `metadata`.
    pub fn get(&mut self, id: &str) -> Result<SpriteView<'_, B::Image>> {
        self.ensure_built()?;
        let atlas = self.atlas.as_ref();
        Ok(SpriteView {
            atlas,
            uv: atlas.and_then(|atlas| atlas.get(id)),
            metadata: self.registry.get_metadata(id),
        })
    }

    /// Pixel rectangle of a sprite inside the atlas texture.
    pub fn get_quad(&mut self, id: &str) -> Result<Option<Rect>> {
        self.ensure_built()?;
        Ok(self
            .atlas
            .as_ref()
            .and_then(|atlas| quad_for(&self.backend, atlas, id)))
    }

    /// Ids in grid column `index`, top to bottom.
    ///
    /// Columns are derived from `default_tile_size`; they are only
    /// meaningful when every sprite has that size.
    pub fn get_column(&mut self, index: u32) -> Result<Vec<String>> {
        self.grid_axis(index, Axis::Column)
    }

    /// Ids in grid row `index`, left to right.
    ///
    /// Same tile-size caveat as [`get_column`](Self::get_column).
    pub fn get_row(&mut self, index: u32) -> Result<Vec<String>> {
        self.grid_axis(index, Axis::Row)
    }

    fn grid_axis(&mut self, index: u32, axis: Axis) -> Result<Vec<String>> {
        self.ensure_built()?;
        let Some(atlas) = self.atlas.as_ref() else {
            return Ok(Vec::new());
        };

        let atlas_size = atlas.size() as f32;
        let tile = self.config.default_tile_size as f32;
        let target = index as f32 * (tile / atlas_size);

        let mixed = atlas
            .entries()
            .any(|(_, entry)| is_off_grid(entry, atlas_size, tile));
        if mixed {
            warn!(
                "grid query on an atlas with sprites other than {}px; results may be incomplete",
                self.config.default_tile_size
            );
        }

        let mut matches: Vec<(f32, &str)> = atlas
            .entries()
            .filter_map(|(id, entry)| {
                let (along, across) = match axis {
                    Axis::Row => (entry.y, entry.x),
                    Axis::Column => (entry.x, entry.y),
                };
                ((along - target).abs() < GRID_TOLERANCE).then_some((across, id))
            })
            .collect();
        matches.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(matches.into_iter().map(|(_, id)| id.to_string()).collect())
    }

    /// Draw a sprite through the backend. Returns false when nothing was drawn.
    pub fn draw(&mut self, id: &str, params: DrawParams) -> Result<bool> {
        self.ensure_built()?;
        let Some(atlas) = self.atlas.as_ref() else {
            return Ok(false);
        };
        let Some(quad) = quad_for(&self.backend, atlas, id) else {
            return Ok(false);
        };

        self.backend.draw_to_screen(atlas.image(), quad, &params);
        Ok(true)
    }

    /// Start a batch. `None` if there is no atlas.
    pub fn new_batch(&mut self) -> Result<Option<SpriteBatch>> {
        self.ensure_built()?;
        Ok(self.atlas.as_ref().map(|_| SpriteBatch::new()))
    }

    /// Add a sprite to a batch. Returns its index, or `None` for unknown ids.
    pub fn add_to_batch(&mut self, batch: &mut SpriteBatch, id: &str, params: DrawParams) -> Result<Option<usize>> {
        self.ensure_built()?;
        let known = self.atlas.as_ref().is_some_and(|atlas| atlas.contains(id));
        Ok(known.then(|| batch.push(id, params)))
    }

    /// Submit a batch, resolving every quad against the current atlas.
    ///
    /// Returns false when there is no atlas to draw from.
    pub fn draw_batch(&mut self, batch: &SpriteBatch) -> Result<bool> {
        self.ensure_built()?;
        let Some(atlas) = self.atlas.as_ref() else {
            return Ok(false);
        };

        let instances: Vec<BatchInstance> = batch
            .items()
            .iter()
            .filter_map(|item| {
                quad_for(&self.backend, atlas, &item.id).map(|quad| BatchInstance {
                    quad,
                    params: item.params,
                })
            })
            .collect();

        self.backend.draw_batch(atlas.image(), &instances);
        Ok(true)
    }

    /// Encode the atlas to a file. The format follows the extension, PNG by default.
    pub fn save_atlas(&mut self, filename: impl AsRef<Path>) -> Result<()> {
        self.ensure_built()?;
        let path = filename.as_ref();
        let atlas = self
            .atlas
            .as_ref()
            .ok_or_else(|| AtlasError::Export("no atlas has been built".to_string()))?;

        let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
        self.backend.encode_to_file(atlas.image(), format, path)?;
        debug!("saved atlas to {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Row,
    Column,
}

/// True when an entry is not exactly one tile in both dimensions.
fn is_off_grid(entry: &AtlasEntry, atlas_size: f32, tile: f32) -> bool {
    (entry.w * atlas_size - tile).abs() > 0.5 || (entry.h * atlas_size - tile).abs() > 0.5
}

fn quad_for<B: GraphicsBackend>(backend: &B, atlas: &Atlas<B::Image>, id: &str) -> Option<Rect> {
    let (width, height) = backend.image_size(atlas.image());
    atlas.get(id).map(|entry| entry.to_pixels(width, height))
}
