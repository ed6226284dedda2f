//! One-shot sprite atlas builder on top of [`AtlasManager`].

use super::AtlasManager;
use crate::error::{AtlasError, Result};
use crate::types::Region;
use image::ImageEncoder;
use std::collections::HashMap;

/// An RGBA8 image to be packed into an atlas.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    /// RGBA8 pixel data (4 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Create a new texture from RGBA data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a texture filled with a single color.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = (0..width * height)
            .flat_map(|_| color.iter().copied())
            .collect();
        Self::new(width, height, pixels)
    }
}

/// A region within the texture atlas.
#[derive(Debug, Clone, Copy)]
pub struct AtlasRegion {
    /// Pixel rectangle of the sprite, padding excluded.
    pub rect: Region,
    /// U coordinate of the left edge (0-1).
    pub u_min: f32,
    /// V coordinate of the top edge (0-1).
    pub v_min: f32,
    /// U coordinate of the right edge (0-1).
    pub u_max: f32,
    /// V coordinate of the bottom edge (0-1).
    pub v_max: f32,
}

impl AtlasRegion {
    fn new(rect: Region, atlas_size: u32) -> Self {
        let size = atlas_size as f32;
        Self {
            rect,
            u_min: rect.x as f32 / size,
            v_min: rect.y as f32 / size,
            u_max: (rect.x + rect.width) as f32 / size,
            v_max: (rect.y + rect.height) as f32 / size,
        }
    }

    /// Get the width of this region in UV space.
    pub fn width(&self) -> f32 {
        self.u_max - self.u_min
    }

    /// Get the height of this region in UV space.
    pub fn height(&self) -> f32 {
        self.v_max - self.v_min
    }

    /// Transform a local UV coordinate (0-1) to atlas coordinate.
    pub fn transform_uv(&self, u: f32, v: f32) -> [f32; 2] {
        [
            self.u_min + u * self.width(),
            self.v_min + v * self.height(),
        ]
    }
}

/// A built texture atlas.
#[derive(Debug)]
pub struct TextureAtlas {
    /// Width of the atlas in pixels.
    pub width: u32,
    /// Height of the atlas in pixels.
    pub height: u32,
    /// RGBA pixel data.
    pub pixels: Vec<u8>,
    /// Mapping from sprite name to atlas region.
    pub regions: HashMap<String, AtlasRegion>,
}

impl TextureAtlas {
    /// Get the region for a sprite.
    pub fn get_region(&self, name: &str) -> Option<&AtlasRegion> {
        self.regions.get(name)
    }

    /// Check if the atlas contains a sprite.
    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    /// Create an empty atlas.
    pub fn empty() -> Self {
        Self {
            width: 16,
            height: 16,
            pixels: vec![255; 16 * 16 * 4], // White
            regions: HashMap::new(),
        }
    }

    /// Export the atlas as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let cursor = std::io::Cursor::new(&mut bytes);
        let encoder = image::codecs::png::PngEncoder::new(cursor);

        encoder
            .write_image(
                &self.pixels,
                self.width,
                self.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| AtlasError::Export(format!("Failed to encode PNG: {}", e)))?;

        Ok(bytes)
    }
}

/// Builder for creating sprite atlases.
pub struct AtlasBuilder {
    max_size: u32,
    padding: u32,
    textures: HashMap<String, TextureData>,
}

impl AtlasBuilder {
    /// Create a new atlas builder.
    pub fn new(max_size: u32, padding: u32) -> Self {
        Self {
            max_size,
            padding,
            textures: HashMap::new(),
        }
    }

    /// Add a sprite to the atlas.
    pub fn add_texture(&mut self, name: String, texture: TextureData) {
        self.textures.insert(name, texture);
    }

    /// Build the atlas, doubling its side until every sprite fits.
    pub fn build(self) -> Result<TextureAtlas> {
        if self.textures.is_empty() {
            return Ok(TextureAtlas::empty());
        }

        let padding = self.padding;
        let max_size = self.max_size;

        if let Some((name, _)) = self
            .textures
            .iter()
            .find(|(_, t)| t.width == 0 || t.height == 0)
        {
            return Err(AtlasError::AtlasBuild(format!(
                "Texture '{}' has a zero dimension",
                name
            )));
        }

        // Largest first packs tighter; the name keeps the order deterministic.
        let mut textures: Vec<_> = self.textures.into_iter().collect();
        textures.sort_by(|a, b| {
            let area = |t: &TextureData| u64::from(t.width) * u64::from(t.height);
            area(&b.1).cmp(&area(&a.1)).then_with(|| a.0.cmp(&b.0))
        });

        let total_area: u64 = textures
            .iter()
            .map(|(_, t)| u64::from(t.width + padding * 2) * u64::from(t.height + padding * 2))
            .sum();

        // Start with minimum size that could fit all textures
        let min_size = (total_area as f64).sqrt().ceil() as u32;
        let mut atlas_size = 64u32;
        while atlas_size < min_size && atlas_size < max_size {
            atlas_size *= 2;
        }

        // Try to pack at increasing sizes
        loop {
            if atlas_size > max_size {
                return Err(AtlasError::AtlasBuild(format!(
                    "Failed to pack {} textures into {}x{} atlas",
                    textures.len(),
                    max_size,
                    max_size
                )));
            }

            if let Some((pixels, regions)) = try_pack(&textures, atlas_size, padding) {
                tracing::debug!(atlas_size, sprites = regions.len(), "built sprite atlas");
                return Ok(TextureAtlas {
                    width: atlas_size,
                    height: atlas_size,
                    pixels,
                    regions,
                });
            }

            atlas_size *= 2;
        }
    }
}

/// Try to pack textures into an atlas of the given size.
fn try_pack(
    textures: &[(String, TextureData)],
    atlas_size: u32,
    padding: u32,
) -> Option<(Vec<u8>, HashMap<String, AtlasRegion>)> {
    let mut manager = AtlasManager::new(atlas_size, atlas_size);
    let mut slots = Vec::with_capacity(textures.len());

    for (_, texture) in textures {
        let slot = manager.allocate(texture.width + padding * 2, texture.height + padding * 2);
        if slot.is_empty() {
            tracing::trace!(atlas_size, placed = slots.len(), "sprites don't fit, growing atlas");
            release(manager, slots);
            return None;
        }
        slots.push(slot);
    }

    let mut pixels = vec![0u8; atlas_size as usize * atlas_size as usize * 4];
    let mut regions = HashMap::new();

    for ((name, texture), slot) in textures.iter().zip(&slots) {
        // Copy texture pixels to atlas with edge-clamped padding.
        // Padding pixels get the nearest edge pixel color to prevent
        // bilinear filtering from bleeding black at texel boundaries.
        for py in 0..slot.height {
            for px in 0..slot.width {
                let sx = (px as i64 - padding as i64).clamp(0, texture.width as i64 - 1) as u32;
                let sy = (py as i64 - padding as i64).clamp(0, texture.height as i64 - 1) as u32;

                let src_idx = ((sy * texture.width + sx) * 4) as usize;
                let dst_x = (slot.x + px) as usize;
                let dst_y = (slot.y + py) as usize;
                let dst_idx = (dst_y * atlas_size as usize + dst_x) * 4;

                if src_idx + 4 <= texture.pixels.len() && dst_idx + 4 <= pixels.len() {
                    pixels[dst_idx..dst_idx + 4]
                        .copy_from_slice(&texture.pixels[src_idx..src_idx + 4]);
                }
            }
        }

        let rect = Region::new(
            slot.x + padding,
            slot.y + padding,
            texture.width,
            texture.height,
        );
        regions.insert(name.clone(), AtlasRegion::new(rect, atlas_size));
    }

    release(manager, slots);
    Some((pixels, regions))
}

/// Hand every slot back so the scratch manager is torn down empty.
fn release(mut manager: AtlasManager, slots: Vec<Region>) {
    for slot in slots {
        manager.free(slot);
    }
    manager.destroy();
}
