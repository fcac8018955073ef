//! Batched sprite drawing.

use crate::types::{DrawParams, Rect};
use serde::{Deserialize, Serialize};

/// A resolved batch element handed to the backend: atlas quad plus placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchInstance {
    pub quad: Rect,
    pub params: DrawParams,
}

/// A sprite queued in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: String,
    pub params: DrawParams,
}

/// Sprites to submit to the backend in a single call.
///
/// Items hold sprite ids, not quads; quads are looked up in the atlas that is
/// current when the batch is drawn.
#[derive(Debug, Clone, Default)]
pub struct SpriteBatch {
    items: Vec<BatchItem>,
}

impl SpriteBatch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, id: &str, params: DrawParams) -> usize {
        self.items.push(BatchItem {
            id: id.to_string(),
            params,
        });
        self.items.len() - 1
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove all items but keep the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
