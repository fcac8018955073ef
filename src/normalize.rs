//! Square tile normalization.
//!
//! Every sprite is stored as a square image. Non-square sources are either
//! treated as a grid of square cells (one dimension divides the other, keep
//! one cell) or padded up to a square of the larger side.

use crate::backend::GraphicsBackend;
use crate::error::{AtlasError, Result};

/// Pick the square tile side for a source image.
pub fn tile_size_for(width: u32, height: u32) -> u32 {
    if width == height {
        return width;
    }

    let (small, large) = if width < height {
        (width, height)
    } else {
        (height, width)
    };

    if small > 0 && large % small == 0 {
        small
    } else {
        large
    }
}

/// Scale `image` to cover a `target × target` tile, centered, on a
/// transparent background.
///
/// The scale factor comes from the smaller source side, so the image fills
/// the tile without distortion and the larger axis is clipped.
pub fn resize_to_fit<B: GraphicsBackend>(backend: &mut B, image: &B::Image, target: u32) -> B::Image {
    let (width, height) = backend.image_size(image);
    let scale = target as f32 / width.min(height) as f32;
    let scaled_width = width as f32 * scale;
    let scaled_height = height as f32 * scale;
    let offset_x = (target as f32 - scaled_width) / 2.0;
    let offset_y = (target as f32 - scaled_height) / 2.0;

    let mut canvas = backend.new_canvas(target, target);
    backend.clear(&mut canvas);
    backend.draw_onto(&mut canvas, image, offset_x, offset_y, scale);
    backend.read_back(&canvas)
}

/// Normalize an image to a square tile of side `target`.
///
/// Returns the image untouched when it already has exactly that size.
pub fn normalize<B: GraphicsBackend>(backend: &mut B, image: B::Image, target: u32) -> Result<B::Image> {
    let (width, height) = backend.image_size(&image);
    if width == 0 || height == 0 || target == 0 {
        return Err(AtlasError::InvalidImage(format!(
            "cannot normalize {}x{} image to a {}px tile",
            width, height, target
        )));
    }

    if width == target && height == target {
        return Ok(image);
    }

    Ok(resize_to_fit(backend, &image, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_tile_size_policy() {
        assert_eq!(tile_size_for(16, 16), 16);
        // 16x64 strip is four 16px cells
        assert_eq!(tile_size_for(16, 64), 16);
        assert_eq!(tile_size_for(64, 16), 16);
        // 48 is not a multiple of 32, so pad up
        assert_eq!(tile_size_for(32, 48), 48);
        assert_eq!(tile_size_for(30, 20), 30);
    }

    #[test]
    fn test_non_divisible_becomes_larger_square() {
        let mut backend = SoftwareBackend::new();
        let image = RgbaImage::from_pixel(32, 48, Rgba([200, 0, 0, 255]));
        let target = tile_size_for(32, 48);
        let normalized = normalize(&mut backend, image, target).unwrap();
        assert_eq!(normalized.dimensions(), (48, 48));
        // Scaled by the smaller side, so the tile is fully covered
        assert_eq!(normalized.get_pixel(0, 0).0, [200, 0, 0, 255]);
        assert_eq!(normalized.get_pixel(47, 47).0, [200, 0, 0, 255]);
    }

    #[test]
    fn test_exact_size_is_untouched() {
        let mut backend = SoftwareBackend::new();
        let mut image = RgbaImage::new(16, 16);
        image.put_pixel(3, 4, Rgba([1, 2, 3, 4]));
        let normalized = normalize(&mut backend, image.clone(), 16).unwrap();
        assert_eq!(normalized, image);
    }

    #[test]
    fn test_resize_centers_and_clips() {
        let mut backend = SoftwareBackend::new();
        // Left half red, right half blue, 4x2
        let mut image = RgbaImage::new(4, 2);
        for y in 0..2 {
            for x in 0..4 {
                let color = if x < 2 { [255, 0, 0, 255] } else { [0, 0, 255, 255] };
                image.put_pixel(x, y, Rgba(color));
            }
        }

        // Scale 1, offset x = -1: columns 1..3 survive
        let tile = resize_to_fit(&mut backend, &image, 2);
        assert_eq!(tile.dimensions(), (2, 2));
        assert_eq!(tile.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(tile.get_pixel(1, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_upscale_square() {
        let mut backend = SoftwareBackend::new();
        let image = RgbaImage::from_pixel(8, 8, Rgba([9, 9, 9, 255]));
        let tile = normalize(&mut backend, image, 16).unwrap();
        assert_eq!(tile.dimensions(), (16, 16));
        assert_eq!(tile.get_pixel(15, 15).0, [9, 9, 9, 255]);
    }

    #[test]
    fn test_thin_non_divisible_source() {
        let mut backend = SoftwareBackend::new();
        let image = RgbaImage::from_pixel(2, 1001, Rgba([7, 8, 9, 255]));
        let target = tile_size_for(2, 1001);
        assert_eq!(target, 1001);

        let tile = normalize(&mut backend, image, target).unwrap();
        assert_eq!(tile.dimensions(), (1001, 1001));
        assert_eq!(tile.get_pixel(0, 0).0, [7, 8, 9, 255]);
        assert_eq!(tile.get_pixel(1000, 1000).0, [7, 8, 9, 255]);
    }

    #[test]
    fn test_zero_target_rejected() {
        let mut backend = SoftwareBackend::new();
        let image = RgbaImage::new(4, 4);
        assert!(normalize(&mut backend, image, 0).is_err());
    }
}
