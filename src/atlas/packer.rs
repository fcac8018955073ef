//! Fixed-size texture atlas using shelf (row) packing.

use crate::backend::GraphicsBackend;
use crate::error::{AtlasError, Result};
use crate::registry::SpriteRegistry;
use crate::types::{Metadata, Rect};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do with a sprite that does not fit inside the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Fail the rebuild with [`AtlasError::CapacityExceeded`].
    #[default]
    Reject,
    /// Write the sprite anyway; pixels outside the atlas are lost.
    Clip,
}

/// A sprite's location in the atlas, normalized to atlas dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasEntry {
    /// Left edge (0-1).
    pub x: f32,
    /// Top edge (0-1).
    pub y: f32,
    /// Width (0-1).
    pub w: f32,
    /// Height (0-1).
    pub h: f32,
    /// Metadata of the sprite at the time the atlas was built.
    pub metadata: Metadata,
}

impl AtlasEntry {
    fn from_placement(placement: &Placement, atlas_size: u32, metadata: Metadata) -> Self {
        let size = atlas_size as f32;
        Self {
            x: placement.x as f32 / size,
            y: placement.y as f32 / size,
            w: placement.width as f32 / size,
            h: placement.height as f32 / size,
            metadata,
        }
    }

    /// Convert to a pixel rectangle for an atlas of the given dimensions.
    pub fn to_pixels(&self, atlas_width: u32, atlas_height: u32) -> Rect {
        let width = atlas_width as f32;
        let height = atlas_height as f32;
        Rect::new(self.x * width, self.y * height, self.w * width, self.h * height)
    }
}

/// A packed atlas: one texture plus the UV entry of every sprite in it.
#[derive(Debug)]
pub struct Atlas<I> {
    image: I,
    size: u32,
    entries: HashMap<String, AtlasEntry>,
    order: Vec<String>,
    generation: u64,
}

impl<I> Atlas<I> {
    /// The packed texture.
    pub fn image(&self) -> &I {
        &self.image
    }

    /// Side length of the atlas in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Registry generation the atlas was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: &str) -> Option<&AtlasEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Entries in packing order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &AtlasEntry)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| (id.as_str(), entry)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pixel position of one packed rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn fits(&self, atlas_size: u32) -> bool {
        self.right() <= atlas_size && self.bottom() <= atlas_size
    }
}

/// Lay out rectangles left to right, starting a new row whenever the next
/// one would cross the right edge. Rows are as tall as their tallest item.
///
/// No vertical bound is applied; check [`Placement::fits`] afterwards.
pub fn shelf_layout<S>(sizes: S, atlas_size: u32) -> Vec<Placement>
where
    S: IntoIterator<Item = (u32, u32)>,
{
    let mut current_x = 0u32;
    let mut current_y = 0u32;
    let mut row_height = 0u32;

    sizes
        .into_iter()
        .map(|(width, height)| {
            if current_x + width > atlas_size {
                current_x = 0;
                current_y += row_height;
                row_height = 0;
            }

            let placement = Placement {
                x: current_x,
                y: current_y,
                width,
                height,
            };

            current_x += width;
            row_height = row_height.max(height);
            placement
        })
        .collect()
}

/// Pack every registered sprite, in registration order, into a new atlas.
///
/// The previous atlas is not touched; callers swap in the result.
pub fn pack<B: GraphicsBackend>(
    backend: &mut B,
    registry: &SpriteRegistry<B::Image>,
    atlas_size: u32,
    overflow: OverflowPolicy,
) -> Result<Atlas<B::Image>> {
    let sprites: Vec<_> = registry.iter().collect();
    let placements = shelf_layout(
        sprites.iter().map(|sprite| backend.image_size(&sprite.image)),
        atlas_size,
    );

    let mut canvas = backend.new_canvas(atlas_size, atlas_size);
    backend.clear(&mut canvas);

    let mut entries = HashMap::with_capacity(sprites.len());
    let mut order = Vec::with_capacity(sprites.len());

    for (sprite, placement) in sprites.iter().zip(&placements) {
        if !placement.fits(atlas_size) {
            match overflow {
                OverflowPolicy::Reject => {
                    return Err(AtlasError::CapacityExceeded {
                        id: sprite.id.clone(),
                        x: placement.x,
                        y: placement.y,
                        width: placement.width,
                        height: placement.height,
                        atlas_size,
                    });
                }
                OverflowPolicy::Clip => {
                    warn!(
                        "sprite '{}' at {},{} overflows the {}px atlas and will be clipped",
                        sprite.id, placement.x, placement.y, atlas_size
                    );
                }
            }
        }

        backend.draw_onto(
            &mut canvas,
            &sprite.image,
            placement.x as f32,
            placement.y as f32,
            1.0,
        );

        entries.insert(
            sprite.id.clone(),
            AtlasEntry::from_placement(placement, atlas_size, sprite.metadata.clone()),
        );
        order.push(sprite.id.clone());
    }

    Ok(Atlas {
        image: backend.read_back(&canvas),
        size: atlas_size,
        entries,
        order,
        generation: registry.generation(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use crate::registry::Sprite;
    use image::{Rgba, RgbaImage};

    fn create_test_sprite(id: &str, size: u32, color: [u8; 4]) -> Sprite<RgbaImage> {
        Sprite::new(id, RgbaImage::from_pixel(size, size, Rgba(color)), size, (size, size))
    }

    #[test]
    fn test_shelf_wraps_rows() {
        let placements = shelf_layout([(16, 16), (16, 16), (16, 16)], 32);
        assert_eq!(
            placements.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>(),
            vec![(0, 0), (16, 0), (0, 16)]
        );
    }

    #[test]
    fn test_row_height_is_tallest_in_row() {
        let placements = shelf_layout([(10, 4), (10, 12), (10, 6), (20, 3), (5, 5)], 32);
        // Row 0 holds three items, tallest is 12
        assert_eq!((placements[2].x, placements[2].y), (20, 0));
        assert_eq!((placements[3].x, placements[3].y), (0, 12));
        assert_eq!((placements[4].x, placements[4].y), (20, 12));
    }

    #[test]
    fn test_right_edge_never_exceeds_atlas() {
        let sizes: Vec<(u32, u32)> = (1..40).map(|i| ((i * 7) % 23 + 1, (i * 5) % 17 + 1)).collect();
        let atlas_size = 64;
        let placements = shelf_layout(sizes.iter().copied(), atlas_size);

        let mut row_y = 0;
        let mut row_max = 0;
        for placement in &placements {
            assert!(placement.right() <= atlas_size);
            if placement.y != row_y {
                // A new row starts exactly below the tallest item of the previous one
                assert_eq!(placement.y, row_y + row_max);
                assert_eq!(placement.x, 0);
                row_y = placement.y;
                row_max = 0;
            }
            row_max = row_max.max(placement.height);
        }
    }

    #[test]
    fn test_pack_entries_are_normalized() {
        let mut backend = SoftwareBackend::new();
        let mut registry = SpriteRegistry::new();
        registry.register(create_test_sprite("red", 16, [255, 0, 0, 255]));
        registry.register(create_test_sprite("green", 16, [0, 255, 0, 255]));

        let atlas = pack(&mut backend, &registry, 64, OverflowPolicy::Reject).unwrap();
        assert_eq!(atlas.len(), 2);

        let green = atlas.get("green").unwrap();
        assert_eq!((green.x, green.y, green.w, green.h), (0.25, 0.0, 0.25, 0.25));
        assert_eq!(atlas.image().get_pixel(20, 4).0, [0, 255, 0, 255]);
        assert_eq!(atlas.image().get_pixel(40, 4).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_pack_is_deterministic() {
        let mut registry = SpriteRegistry::new();
        for (i, id) in ["k", "c", "x", "a", "m"].iter().enumerate() {
            registry.register(create_test_sprite(id, 8 + i as u32 * 4, [i as u8, 0, 0, 255]));
        }

        let first = pack(&mut SoftwareBackend::new(), &registry, 48, OverflowPolicy::Clip).unwrap();
        let second = pack(&mut SoftwareBackend::new(), &registry, 48, OverflowPolicy::Clip).unwrap();

        for (id, entry) in first.entries() {
            assert_eq!(second.get(id), Some(entry));
        }
        assert_eq!(first.image(), second.image());
    }

    #[test]
    fn test_overflow_rejected() {
        let mut registry = SpriteRegistry::new();
        for id in ["a", "b", "c", "d", "e"] {
            registry.register(create_test_sprite(id, 16, [255, 255, 255, 255]));
        }

        let err = pack(&mut SoftwareBackend::new(), &registry, 32, OverflowPolicy::Reject).unwrap_err();
        match err {
            AtlasError::CapacityExceeded { id, y, .. } => {
                assert_eq!(id, "e");
                assert_eq!(y, 32);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overflow_clipped() {
        let mut registry = SpriteRegistry::new();
        for id in ["a", "b", "c", "d", "e"] {
            registry.register(create_test_sprite(id, 16, [255, 255, 255, 255]));
        }

        let atlas = pack(&mut SoftwareBackend::new(), &registry, 32, OverflowPolicy::Clip).unwrap();
        let clipped = atlas.get("e").unwrap();
        assert_eq!(clipped.y, 1.0);
        assert_eq!(atlas.image().dimensions(), (32, 32));
    }

    #[test]
    fn test_empty_registry_packs_empty_atlas() {
        let registry: SpriteRegistry<RgbaImage> = SpriteRegistry::new();
        let atlas = pack(&mut SoftwareBackend::new(), &registry, 16, OverflowPolicy::Reject).unwrap();
        assert!(atlas.is_empty());
        assert_eq!(atlas.size(), 16);
    }

    #[test]
    fn test_entry_to_pixels() {
        let entry = AtlasEntry {
            x: 0.25,
            y: 0.5,
            w: 0.125,
            h: 0.125,
            metadata: Metadata::new(),
        };
        assert_eq!(entry.to_pixels(512, 512), Rect::new(128.0, 256.0, 64.0, 64.0));
    }
}
