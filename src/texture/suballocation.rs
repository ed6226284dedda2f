//! Regions handed out by a dynamic texture atlas.

use super::DynamicTextureAtlas;
use crate::types::Region;
use glam::{UVec2, Vec4};

/// A rectangle of one slice of a [`DynamicTextureAtlas`].
///
/// Not `Clone`: a suballocation is given back with
/// [`DynamicTextureAtlas::free`] exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct Suballocation {
    pub(super) subregion: Region,
    pub(super) slice: u32,
    pub(super) alignment: u32,
    pub(super) size: UVec2,
}

impl Suballocation {
    /// Texel origin of the region within its slice.
    pub fn origin(&self) -> UVec2 {
        UVec2::new(
            self.subregion.x * self.alignment,
            self.subregion.y * self.alignment,
        )
    }

    /// Size that was requested.
    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Size actually reserved, rounded up to the alignment.
    pub fn aligned_size(&self) -> UVec2 {
        UVec2::new(
            self.subregion.width * self.alignment,
            self.subregion.height * self.alignment,
        )
    }

    pub fn slice(&self) -> u32 {
        self.slice
    }

    pub fn alignment(&self) -> u32 {
        self.alignment
    }

    /// Region in alignment units, as handed out by the slice's manager.
    pub fn subregion(&self) -> Region {
        self.subregion
    }

    /// UV transform `(scale_u, scale_v, bias_u, bias_v)` mapping a unit
    /// square onto this region of the atlas.
    pub fn uv_scale_bias(&self, atlas: &DynamicTextureAtlas) -> Vec4 {
        let origin = self.origin().as_vec2();
        let size = self.size.as_vec2();
        let width = atlas.width() as f32;
        let height = atlas.height() as f32;
        Vec4::new(
            size.x / width,
            size.y / height,
            origin.x / width,
            origin.y / height,
        )
    }
}
