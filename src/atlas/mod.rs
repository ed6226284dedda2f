//! Dynamic rectangle allocation.
//!
//! [`AtlasManager`] partitions a fixed-size surface into a tree of
//! rectangles. Allocation carves the tightest fitting free leaf into the
//! requested rectangle plus at most two leftover strips; freeing merges
//! sibling leaves back together as soon as all of them are free again.
//!
//! [`AtlasBuilder`] is a one-shot client that packs a set of images into a
//! single atlas image.

mod builder;
mod index;
mod manager;
mod node;

pub use builder::{AtlasBuilder, AtlasRegion, TextureAtlas, TextureData};
pub use manager::AtlasManager;
