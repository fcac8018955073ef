//! # Sprite Atlas
//!
//! A runtime sprite atlas manager: loads individual images, normalizes them
//! to square tiles, shelf-packs them into one fixed-size texture and answers
//! UV, quad and grid queries against it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sprite_atlas::{AtlasConfig, AtlasManager, DrawParams, SoftwareBackend};
//!
//! let config = AtlasConfig::default().with_tile_size(16).with_atlas_size(256);
//! let mut atlas = AtlasManager::new(SoftwareBackend::new(), "assets/sprites", config);
//!
//! // Resolves to assets/sprites/hero.png, id "hero"
//! atlas.add("hero", None)?;
//! atlas.add("tiles/grass.png", Some("grass"))?;
//!
//! // Reads repack lazily
//! let quad = atlas.get_quad("hero")?;
//! let first_row = atlas.get_row(0)?;
//! atlas.draw("grass", DrawParams::at(64.0, 32.0))?;
//!
//! atlas.save_atlas("atlas.png")?;
//! ```
//!
//! ## Backends
//!
//! Pixels are only touched through the [`GraphicsBackend`] trait. The
//! bundled [`SoftwareBackend`] uses the `image` crate and records draw calls,
//! which is enough for offline atlas generation and for tests. A renderer
//! integration implements the trait over its own texture and canvas types.

pub mod error;
pub mod types;
pub mod backend;
pub mod normalize;
pub mod registry;
pub mod atlas;
pub mod batch;
pub mod manager;

// Re-export main types for convenience
pub use error::{AtlasError, Result};
pub use types::{DrawParams, Metadata, Rect};
pub use backend::{DrawCommand, GraphicsBackend, SoftwareBackend};
pub use registry::{Sprite, SpriteRegistry};
pub use atlas::{Atlas, AtlasEntry, OverflowPolicy};
pub use batch::{BatchInstance, BatchItem, SpriteBatch};
pub use manager::{AtlasConfig, AtlasManager, RebuildState, SharedAtlasManager, SpriteView};

/// Create a manager on the software backend.
pub fn software_manager<P: Into<std::path::PathBuf>>(
    base_path: P,
    config: AtlasConfig,
) -> AtlasManager<SoftwareBackend> {
    AtlasManager::new(SoftwareBackend::new(), base_path, config)
}

#[cfg(feature = "wasm")]
pub mod wasm;
