//! Error types for the atlas allocator.

use crate::types::Region;
use thiserror::Error;

/// Result type alias using AtlasError.
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Main error type for atlas operations.
#[derive(Error, Debug)]
pub enum AtlasError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or write JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to encode or decode an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Atlas configuration is not usable.
    #[error("Invalid atlas configuration: {0}")]
    InvalidConfig(String),

    /// A region of zero width or height was requested.
    #[error("Requested region size must not be zero")]
    ZeroSizedRequest,

    /// The request is larger than the atlas surface itself.
    #[error("Requested region size {width}x{height} exceeds atlas dimensions {atlas_width}x{atlas_height}")]
    RequestTooLarge {
        width: u32,
        height: u32,
        atlas_width: u32,
        atlas_height: u32,
    },

    /// No free space is large enough for the request.
    #[error("Failed to suballocate a {width}x{height} region")]
    OutOfSpace { width: u32, height: u32 },

    /// The region is not currently allocated by this atlas (unknown or double free).
    #[error("Region {0:?} is not allocated by this atlas")]
    NotAllocated(Region),

    /// Internal tree and index state disagree.
    #[error("Atlas consistency check failed: {0}")]
    Inconsistent(String),

    /// Failed to build a sprite atlas.
    #[error("Atlas building error: {0}")]
    AtlasBuild(String),

    /// Failed to export an atlas layout.
    #[error("Export error: {0}")]
    Export(String),
}
