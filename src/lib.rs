//! # Dynamic Atlas
//!
//! A dynamic 2D rectangle allocator for texture atlases.
//!
//! ## Overview
//!
//! [`AtlasManager`] manages a fixed-size surface, handing out
//! non-overlapping rectangles on request and reclaiming them on release.
//! Freed rectangles are merged with their free siblings immediately, so the
//! surface does not fragment into ever smaller pieces.
//!
//! ## Quick Start
//!
//! ```
//! use dynamic_atlas::AtlasManager;
//!
//! let mut atlas = AtlasManager::new(256, 256);
//!
//! let glyph = atlas.allocate(16, 24);
//! assert!(!glyph.is_empty());
//! assert_eq!((glyph.width, glyph.height), (16, 24));
//!
//! atlas.free(glyph);
//! assert!(atlas.is_empty());
//! assert_eq!(atlas.free_region_count(), 1);
//! ```
//!
//! An empty region means the request did not fit:
//!
//! ```
//! use dynamic_atlas::AtlasManager;
//!
//! let mut atlas = AtlasManager::new(8, 8);
//! assert!(atlas.allocate(16, 1).is_empty());
//! ```
//!
//! ## Texture Atlases
//!
//! [`DynamicTextureAtlas`] layers alignment buckets and texture array slices
//! on top of the allocator, and [`AtlasBuilder`] packs a fixed set of
//! images into a single atlas image.

pub mod error;
pub mod types;
pub mod atlas;
pub mod texture;
pub mod export;

// Re-export main types for convenience
pub use error::{AtlasError, Result};
pub use types::Region;
pub use atlas::{AtlasBuilder, AtlasManager, AtlasRegion, TextureAtlas, TextureData};
pub use texture::{AtlasDimension, DynamicTextureAtlas, Suballocation, TextureAtlasConfig, UsageStats};
pub use export::{render_layout_png, PlacementReport};
