//! CPU backend built on the `image` crate.

use super::GraphicsBackend;
use crate::batch::BatchInstance;
use crate::error::{AtlasError, Result};
use crate::types::{DrawParams, Rect};
use image::imageops::{self, FilterType};
use image::{ImageEncoder, ImageFormat, Rgba, RgbaImage};
use std::path::Path;

/// A draw call recorded by the software backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Source region in atlas pixels.
    pub quad: Rect,
    /// Placement the caller asked for.
    pub params: DrawParams,
    /// Destination corners after the draw transform (TL, TR, BR, BL).
    pub corners: [[f32; 2]; 4],
    /// True when the call came from a batch submission.
    pub batched: bool,
}

/// Headless backend: canvases are RGBA8 buffers and screen draws are
/// recorded instead of rasterized.
#[derive(Debug)]
pub struct SoftwareBackend {
    filter: FilterType,
    draw_calls: Vec<DrawCommand>,
    batch_submissions: usize,
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareBackend {
    /// Create a backend that scales with nearest-neighbour sampling.
    pub fn new() -> Self {
        Self::with_filter(FilterType::Nearest)
    }

    /// Create a backend with a specific resampling filter.
    pub fn with_filter(filter: FilterType) -> Self {
        Self {
            filter,
            draw_calls: Vec::new(),
            batch_submissions: 0,
        }
    }

    /// Screen draws recorded so far.
    pub fn draw_calls(&self) -> &[DrawCommand] {
        &self.draw_calls
    }

    /// Number of `draw_batch` submissions.
    pub fn batch_submissions(&self) -> usize {
        self.batch_submissions
    }

    /// Drop recorded draws, e.g. at the end of a frame.
    pub fn clear_draw_calls(&mut self) {
        self.draw_calls.clear();
        self.batch_submissions = 0;
    }

    /// Encode an image as PNG bytes.
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let cursor = std::io::Cursor::new(&mut bytes);
        let encoder = image::codecs::png::PngEncoder::new(cursor);

        encoder
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| AtlasError::Export(format!("Failed to encode PNG: {}", e)))?;

        Ok(bytes)
    }

    fn record(&mut self, quad: Rect, params: &DrawParams, batched: bool) {
        let corners = params
            .screen_corners(quad.w, quad.h)
            .map(|corner| corner.to_array());
        self.draw_calls.push(DrawCommand {
            quad,
            params: *params,
            corners,
            batched,
        });
    }
}

impl GraphicsBackend for SoftwareBackend {
    type Image = RgbaImage;
    type Canvas = RgbaImage;

    fn decode_image(&mut self, bytes: &[u8]) -> Result<RgbaImage> {
        let img = image::load_from_memory(bytes)?;
        Ok(img.to_rgba8())
    }

    fn image_size(&self, image: &RgbaImage) -> (u32, u32) {
        image.dimensions()
    }

    fn new_canvas(&mut self, width: u32, height: u32) -> RgbaImage {
        RgbaImage::new(width, height)
    }

    fn clear(&mut self, canvas: &mut RgbaImage) {
        for pixel in canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_onto(&mut self, canvas: &mut RgbaImage, image: &RgbaImage, x: f32, y: f32, scale: f32) {
        if (scale - 1.0).abs() < f32::EPSILON {
            imageops::replace(canvas, image, x.round() as i64, y.round() as i64);
            return;
        }

        // Only scale the part of the source that lands on the canvas.
        let Some((left, right)) = visible_span(x, scale, image.width(), canvas.width()) else {
            return;
        };
        let Some((top, bottom)) = visible_span(y, scale, image.height(), canvas.height()) else {
            return;
        };
        let window = imageops::crop_imm(image, left, top, right - left, bottom - top).to_image();

        let width = ((window.width() as f32 * scale).round() as u32).max(1);
        let height = ((window.height() as f32 * scale).round() as u32).max(1);
        let scaled = imageops::resize(&window, width, height, self.filter);

        let dest_x = (x + left as f32 * scale).round() as i64;
        let dest_y = (y + top as f32 * scale).round() as i64;
        imageops::replace(canvas, &scaled, dest_x, dest_y);
    }

    fn read_back(&mut self, canvas: &RgbaImage) -> RgbaImage {
        canvas.clone()
    }

    fn draw_to_screen(&mut self, _atlas: &RgbaImage, quad: Rect, params: &DrawParams) {
        self.record(quad, params, false);
    }

    fn draw_batch(&mut self, _atlas: &RgbaImage, instances: &[BatchInstance]) {
        self.batch_submissions += 1;
        for instance in instances {
            self.record(instance.quad, &instance.params, true);
        }
    }

    fn encode_to_file(&mut self, image: &RgbaImage, format: ImageFormat, path: &Path) -> Result<()> {
        image.save_with_format(path, format)?;
        Ok(())
    }
}

/// Source pixel range `[start, end)` along one axis that is still inside
/// `[0, canvas)` once placed at `offset` and scaled.
fn visible_span(offset: f32, scale: f32, source: u32, canvas: u32) -> Option<(u32, u32)> {
    if scale <= 0.0 {
        return None;
    }
    let start = (-offset / scale).floor().max(0.0) as u32;
    let end = ((canvas as f32 - offset) / scale).ceil().clamp(0.0, source as f32) as u32;
    (start < end).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_draw_onto_clips_at_bounds() {
        let mut backend = SoftwareBackend::new();
        let mut canvas = backend.new_canvas(4, 4);
        backend.clear(&mut canvas);
        backend.draw_onto(&mut canvas, &solid(4, 4, [255, 0, 0, 255]), -2.0, 2.0, 1.0);

        assert_eq!(canvas.get_pixel(0, 2).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(1, 3).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(2, 2).0, [0, 0, 0, 0]);
        assert_eq!(canvas.get_pixel(0, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_draw_onto_scales() {
        let mut backend = SoftwareBackend::new();
        let mut canvas = backend.new_canvas(8, 8);
        backend.draw_onto(&mut canvas, &solid(2, 2, [0, 255, 0, 255]), 0.0, 0.0, 2.0);

        assert_eq!(canvas.get_pixel(3, 3).0, [0, 255, 0, 255]);
        assert_eq!(canvas.get_pixel(4, 4).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_visible_span() {
        // Fully visible
        assert_eq!(visible_span(0.0, 2.0, 2, 8), Some((0, 2)));
        // Centered 32x48 scaled by 1.5 into 48: rows 8..40 survive
        assert_eq!(visible_span(-12.0, 1.5, 48, 48), Some((8, 40)));
        // Entirely off canvas
        assert_eq!(visible_span(100.0, 2.0, 4, 8), None);
        assert_eq!(visible_span(-100.0, 2.0, 4, 8), None);
    }

    #[test]
    fn test_draw_onto_thin_source_scales_only_visible_rows() {
        let mut backend = SoftwareBackend::new();
        let image = solid(2, 1001, [50, 60, 70, 255]);
        let scale = 1001.0 / 2.0;
        let offset_y = (1001.0 - 1001.0 * scale) / 2.0;

        let mut canvas = backend.new_canvas(1001, 1001);
        backend.draw_onto(&mut canvas, &image, 0.0, offset_y, scale);

        assert_eq!(canvas.get_pixel(0, 0).0, [50, 60, 70, 255]);
        assert_eq!(canvas.get_pixel(1000, 1000).0, [50, 60, 70, 255]);
        assert_eq!(canvas.get_pixel(500, 500).0, [50, 60, 70, 255]);
    }

    #[test]
    fn test_draw_onto_cropped_scale_keeps_pixel_positions() {
        let mut backend = SoftwareBackend::new();
        // Four rows of distinct colors, scaled 2x and shifted up by one source row
        let mut image = RgbaImage::new(1, 4);
        for row in 0..4 {
            image.put_pixel(0, row, Rgba([row as u8 * 60, 0, 0, 255]));
        }

        let mut canvas = backend.new_canvas(2, 4);
        backend.draw_onto(&mut canvas, &image, 0.0, -2.0, 2.0);

        assert_eq!(canvas.get_pixel(0, 0).0, [60, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(1, 1).0, [60, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(0, 2).0, [120, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(0, 3).0, [120, 0, 0, 255]);
    }

    #[test]
    fn test_read_back_is_detached() {
        let mut backend = SoftwareBackend::new();
        let mut canvas = backend.new_canvas(2, 2);
        backend.draw_onto(&mut canvas, &solid(2, 2, [1, 2, 3, 255]), 0.0, 0.0, 1.0);
        let image = backend.read_back(&canvas);
        backend.clear(&mut canvas);

        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3, 255]);
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_png_roundtrip_through_decode() {
        let mut backend = SoftwareBackend::new();
        let original = solid(3, 5, [10, 20, 30, 40]);
        let bytes = SoftwareBackend::encode_png(&original).unwrap();
        let decoded = backend.decode_image(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let mut backend = SoftwareBackend::new();
        let err = backend
            .load_image(Path::new("/definitely/not/here.png"))
            .unwrap_err();
        assert!(matches!(err, AtlasError::NotFound(_)));
    }

    #[test]
    fn test_draw_to_screen_records_transformed_corners() {
        let mut backend = SoftwareBackend::new();
        let atlas = solid(32, 32, [0, 0, 0, 0]);
        backend.draw_to_screen(
            &atlas,
            Rect::new(16.0, 0.0, 16.0, 16.0),
            &DrawParams::at(5.0, 7.0).with_scale(2.0, 2.0),
        );

        let call = &backend.draw_calls()[0];
        assert!(!call.batched);
        assert_eq!(call.corners[0], [5.0, 7.0]);
        assert_eq!(call.corners[2], [37.0, 39.0]);
    }
}
