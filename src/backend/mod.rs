//! Graphics backend interface.
//!
//! The atlas core never touches pixels directly. Decoding, canvas
//! allocation, blits, readback and draw calls all go through a
//! [`GraphicsBackend`], so the same packing code can target a GPU renderer
//! or the CPU-side [`SoftwareBackend`].

mod software;

pub use software::{DrawCommand, SoftwareBackend};

use crate::batch::BatchInstance;
use crate::error::{AtlasError, Result};
use crate::types::{DrawParams, Rect};
use image::ImageFormat;
use std::path::Path;

/// Operations the atlas core needs from a renderer.
pub trait GraphicsBackend {
    /// A decoded, standalone image.
    type Image;
    /// An offscreen render target.
    type Canvas;

    /// Decode an encoded image (PNG etc.) from memory.
    fn decode_image(&mut self, bytes: &[u8]) -> Result<Self::Image>;

    /// Load and decode an image file.
    ///
    /// Fails with [`AtlasError::NotFound`] if the path is not an existing file.
    fn load_image(&mut self, path: &Path) -> Result<Self::Image> {
        if !path.is_file() {
            return Err(AtlasError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        self.decode_image(&bytes)
    }

    /// Width and height of an image in pixels.
    fn image_size(&self, image: &Self::Image) -> (u32, u32);

    /// Allocate a canvas of the given size.
    fn new_canvas(&mut self, width: u32, height: u32) -> Self::Canvas;

    /// Reset every pixel of the canvas to transparent.
    fn clear(&mut self, canvas: &mut Self::Canvas);

    /// Draw `image` onto `canvas` with its top-left corner at `(x, y)`,
    /// uniformly scaled. Anything outside the canvas bounds is clipped.
    fn draw_onto(
        &mut self,
        canvas: &mut Self::Canvas,
        image: &Self::Image,
        x: f32,
        y: f32,
        scale: f32,
    );

    /// Copy the canvas contents into an image independent of the canvas.
    fn read_back(&mut self, canvas: &Self::Canvas) -> Self::Image;

    /// Draw the `quad` region of `atlas` to the screen.
    fn draw_to_screen(&mut self, atlas: &Self::Image, quad: Rect, params: &DrawParams);

    /// Draw many quads of the same atlas in one submission.
    fn draw_batch(&mut self, atlas: &Self::Image, instances: &[BatchInstance]) {
        for instance in instances {
            self.draw_to_screen(atlas, instance.quad, &instance.params);
        }
    }

    /// Encode an image and write it to `path`.
    fn encode_to_file(&mut self, image: &Self::Image, format: ImageFormat, path: &Path)
        -> Result<()>;
}
