//! Sprite storage.

use crate::types::Metadata;
use std::collections::HashMap;

/// A registered sprite: normalized square image plus caller metadata.
#[derive(Debug, Clone)]
pub struct Sprite<I> {
    pub id: String,
    /// Normalized square image.
    pub image: I,
    /// Side of the normalized image in pixels.
    pub size: u32,
    /// Dimensions of the image before normalization.
    pub source_size: (u32, u32),
    pub metadata: Metadata,
}

impl<I> Sprite<I> {
    pub fn new(id: impl Into<String>, image: I, size: u32, source_size: (u32, u32)) -> Self {
        Self {
            id: id.into(),
            image,
            size,
            source_size,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Sprites keyed by id, iterated in registration order.
///
/// Every mutation bumps a generation counter; the manager compares it with
/// the generation its atlas was built from to know when to repack.
#[derive(Debug)]
pub struct SpriteRegistry<I> {
    sprites: HashMap<String, Sprite<I>>,
    order: Vec<String>,
    generation: u64,
}

impl<I> Default for SpriteRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> SpriteRegistry<I> {
    pub fn new() -> Self {
        Self {
            sprites: HashMap::new(),
            order: Vec::new(),
            generation: 0,
        }
    }

    /// Store a sprite, replacing any sprite with the same id.
    ///
    /// A replaced sprite keeps its original position in the packing order.
    pub fn register(&mut self, sprite: Sprite<I>) -> String {
        let id = sprite.id.clone();
        if self.sprites.insert(id.clone(), sprite).is_none() {
            self.order.push(id.clone());
        }
        self.generation += 1;
        id
    }

    /// Replace a sprite's metadata. Returns false if the id is unknown.
    pub fn set_metadata(&mut self, id: &str, metadata: Metadata) -> bool {
        match self.sprites.get_mut(id) {
            Some(sprite) => {
                sprite.metadata = metadata;
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    pub fn get_metadata(&self, id: &str) -> Option<&Metadata> {
        self.sprites.get(id).map(|sprite| &sprite.metadata)
    }

    pub fn get(&self, id: &str) -> Option<&Sprite<I>> {
        self.sprites.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sprites.contains_key(id)
    }

    /// Sprites in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Sprite<I>> {
        self.order.iter().filter_map(|id| self.sprites.get(id))
    }

    /// Sprite ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|id| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Mutation counter; changes whenever the sprite set or metadata changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
