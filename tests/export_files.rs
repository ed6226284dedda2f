//! Writing layouts, reports and built atlases to disk.

use dynamic_atlas::export::png::FREE_COLOR;
use dynamic_atlas::{
    render_layout_png, AtlasBuilder, AtlasManager, PlacementReport, TextureData,
};
use std::fs;
use tempfile::tempdir;

#[test]
fn layout_png_round_trips_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("layout.png");

    let mut atlas = AtlasManager::new(32, 16);
    let region = atlas.allocate(8, 8);
    fs::write(&path, render_layout_png(&atlas).unwrap()).unwrap();

    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (32, 16));
    assert_ne!(img.get_pixel(region.x + 3, region.y + 3).0, FREE_COLOR);
    assert_eq!(img.get_pixel(31, 15).0, FREE_COLOR);

    atlas.free(region);
    atlas.destroy();
}

#[test]
fn placement_report_is_written_as_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.json");

    let mut atlas = AtlasManager::new(16, 16);
    let report = PlacementReport::pack(&mut atlas, &[(8, 8), (16, 16), (4, 4)]);
    fs::write(&path, report.to_json().unwrap()).unwrap();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["placed"], 2);
    assert_eq!(json["failed"], 1);
    assert!(json["placements"][1]["region"].is_null());
    assert_eq!(json["placements"][0]["region"]["width"], 8);

    for region in report.regions() {
        atlas.free(region);
    }
    atlas.destroy();
}

#[test]
fn built_atlas_png_decodes_to_its_pixels() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("atlas.png");

    let mut builder = AtlasBuilder::new(256, 0);
    builder.add_texture("red".to_string(), TextureData::solid(16, 16, [255, 0, 0, 255]));
    builder.add_texture("blue".to_string(), TextureData::solid(8, 8, [0, 0, 255, 255]));
    let atlas = builder.build().unwrap();
    fs::write(&path, atlas.to_png().unwrap()).unwrap();

    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (atlas.width, atlas.height));
    assert_eq!(img.into_raw(), atlas.pixels);

    let blue = atlas.get_region("blue").unwrap();
    let idx = ((blue.rect.y * atlas.width + blue.rect.x) * 4) as usize;
    assert_eq!(&atlas.pixels[idx..idx + 4], &[0, 0, 255, 255]);
}
