//! Error types for the sprite atlas.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AtlasError.
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Main error type for atlas operations.
#[derive(Error, Debug)]
pub enum AtlasError {
    /// Failed to decode or encode an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sprite file does not exist at the resolved path.
    #[error("Sprite file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A sprite does not fit inside the fixed-size atlas.
    #[error(
        "Sprite '{id}' ({width}x{height} at {x},{y}) exceeds the {atlas_size}x{atlas_size} atlas"
    )]
    CapacityExceeded {
        id: String,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        atlas_size: u32,
    },

    /// Image has unusable dimensions or pixel data.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Failed to export the atlas.
    #[error("Export error: {0}")]
    Export(String),
}
