//! JSON placement reports for a batch of allocation requests.

use crate::atlas::AtlasManager;
use crate::error::Result;
use crate::types::Region;
use serde::Serialize;

/// Outcome of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub width: u32,
    pub height: u32,
    /// Where the request was placed, `None` if it didn't fit.
    pub region: Option<Region>,
}

/// Outcome of packing a list of sizes into one atlas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementReport {
    pub atlas_width: u32,
    pub atlas_height: u32,
    pub placements: Vec<Placement>,
    pub placed: usize,
    pub failed: usize,
    pub free_area: u64,
    pub free_region_count: usize,
    /// Allocated share of the surface, 0 to 1.
    pub utilization: f64,
}

impl PlacementReport {
    /// Allocate every size from `atlas` in order and record the results.
    ///
    /// Successful allocations stay live in `atlas`. Zero-sized requests are
    /// reported as failed without touching the atlas.
    pub fn pack(atlas: &mut AtlasManager, sizes: &[(u32, u32)]) -> Self {
        let placements: Vec<_> = sizes
            .iter()
            .map(|&(width, height)| {
                let region = if width == 0 || height == 0 {
                    None
                } else {
                    Some(atlas.allocate(width, height)).filter(|r| !r.is_empty())
                };
                Placement {
                    width,
                    height,
                    region,
                }
            })
            .collect();

        let placed = placements.iter().filter(|p| p.region.is_some()).count();
        let surface = u64::from(atlas.width()) * u64::from(atlas.height());
        Self {
            atlas_width: atlas.width(),
            atlas_height: atlas.height(),
            failed: placements.len() - placed,
            placed,
            placements,
            free_area: atlas.total_free_area(),
            free_region_count: atlas.free_region_count(),
            utilization: (surface - atlas.total_free_area()) as f64 / surface as f64,
        }
    }

    /// Regions that were placed, in request order.
    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.placements.iter().filter_map(|p| p.region)
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_report() {
        let mut atlas = AtlasManager::new(8, 8);
        let report = PlacementReport::pack(&mut atlas, &[(8, 4), (8, 4), (1, 1), (0, 3)]);

        assert_eq!(report.placed, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.placements[0].region, Some(Region::new(0, 0, 8, 4)));
        assert_eq!(report.placements[1].region, Some(Region::new(0, 4, 8, 4)));
        assert_eq!(report.placements[2].region, None);
        assert_eq!(report.free_area, 0);
        assert!((report.utilization - 1.0).abs() < f64::EPSILON);

        for region in report.regions().collect::<Vec<_>>() {
            atlas.free(region);
        }
        assert!(atlas.is_empty());
    }

    #[test]
    fn test_report_json() {
        let mut atlas = AtlasManager::new(16, 16);
        let report = PlacementReport::pack(&mut atlas, &[(4, 4), (32, 1)]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["placed"], 1);
        assert_eq!(json["placements"][0]["region"]["width"], 4);
        assert!(json["placements"][1]["region"].is_null());

        for region in report.regions().collect::<Vec<_>>() {
            atlas.free(region);
        }
    }
}
