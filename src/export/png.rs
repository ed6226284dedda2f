//! PNG rendering of an allocator's current layout.

use crate::atlas::AtlasManager;
use crate::error::{AtlasError, Result};
use crate::types::Region;
use image::{Rgba, RgbaImage};

/// Color of free space.
pub const FREE_COLOR: [u8; 4] = [32, 32, 32, 255];

/// Largest surface side that will be rendered.
pub const MAX_RENDER_SIZE: u32 = 8192;

/// Render the layout with one pixel per atlas unit. Free regions are dark
/// grey, allocated regions get a color derived from their position and size
/// with a darker outline.
pub fn render_layout(atlas: &AtlasManager) -> Result<RgbaImage> {
    if atlas.width() > MAX_RENDER_SIZE || atlas.height() > MAX_RENDER_SIZE {
        return Err(AtlasError::Export(format!(
            "{}x{} atlas is too large to render",
            atlas.width(),
            atlas.height()
        )));
    }

    let mut img = RgbaImage::from_pixel(atlas.width(), atlas.height(), Rgba(FREE_COLOR));
    for region in atlas.allocated_regions() {
        let fill = region_color(&region);
        let outline = Rgba([fill[0] / 2, fill[1] / 2, fill[2] / 2, 255]);
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                let edge = x == region.x
                    || y == region.y
                    || x + 1 == region.x + region.width
                    || y + 1 == region.y + region.height;
                let color = if edge && region.width > 2 && region.height > 2 {
                    outline
                } else {
                    Rgba(fill)
                };
                img.put_pixel(x, y, color);
            }
        }
    }
    Ok(img)
}

/// Render the layout and encode it as PNG bytes.
pub fn render_layout_png(atlas: &AtlasManager) -> Result<Vec<u8>> {
    let img = render_layout(atlas)?;
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

/// Deterministic, reasonably bright color for a region.
fn region_color(region: &Region) -> [u8; 4] {
    let mut h = u64::from(region.x).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h ^= u64::from(region.y).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h ^= (u64::from(region.width) << 16) | u64::from(region.height);
    h = h.wrapping_mul(0x1656_67B1_9E37_79F9);
    h ^= h >> 29;
    [
        96 + (h & 0x9F) as u8,
        96 + ((h >> 8) & 0x9F) as u8,
        96 + ((h >> 16) & 0x9F) as u8,
        255,
    ]
}
