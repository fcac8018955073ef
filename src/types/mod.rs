//! Shared types used throughout the library.

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

/// Opaque per-sprite payload. Stored and forwarded, never interpreted.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A pixel-space rectangle describing a sub-region of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Corners in drawing order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.x, self.y),
            Vec2::new(self.right(), self.y),
            Vec2::new(self.right(), self.bottom()),
            Vec2::new(self.x, self.bottom()),
        ]
    }
}

/// Placement of a sprite when drawn to screen or added to a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawParams {
    pub x: f32,
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Origin offset in sprite-local pixels; rotation and scale pivot here.
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

impl DrawParams {
    /// Draw at a screen position with no rotation and unit scale.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    pub fn with_origin(mut self, origin_x: f32, origin_y: f32) -> Self {
        self.origin_x = origin_x;
        self.origin_y = origin_y;
        self
    }

    /// Sprite-local to screen transform: translate, rotate, scale, then
    /// shift by the negated origin.
    pub fn transform(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(
            Vec2::new(self.scale_x, self.scale_y),
            self.rotation,
            Vec2::new(self.x, self.y),
        ) * Affine2::from_translation(Vec2::new(-self.origin_x, -self.origin_y))
    }

    /// Screen-space corners of a quad of the given pixel size.
    pub fn screen_corners(&self, width: f32, height: f32) -> [Vec2; 4] {
        let transform = self.transform();
        Rect::new(0.0, 0.0, width, height)
            .corners()
            .map(|corner| transform.transform_point2(corner))
    }
}
