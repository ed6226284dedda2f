//! Lookup indices over the leaves of the partition tree.
//!
//! Free leaves are kept in two ordered maps (width-first and height-first)
//! so the tightest fitting region can be found without walking the tree.
//! Both maps are only ever mutated together through [`FreeIndex::insert`]
//! and [`FreeIndex::remove`], which keeps their membership identical.

use super::node::NodeId;
use crate::types::{HeightFirst, Region, WidthFirst};
use std::collections::{BTreeMap, HashMap};

/// Dual ordered index of free leaf regions.
#[derive(Debug, Default)]
pub(crate) struct FreeIndex {
    by_width: BTreeMap<WidthFirst, NodeId>,
    by_height: BTreeMap<HeightFirst, NodeId>,
}

impl FreeIndex {
    pub fn insert(&mut self, region: Region, id: NodeId) {
        let prev_w = self.by_width.insert(WidthFirst(region), id);
        let prev_h = self.by_height.insert(HeightFirst(region), id);
        assert!(
            prev_w.is_none() && prev_h.is_none(),
            "free region {:?} registered twice",
            region
        );
    }

    pub fn remove(&mut self, region: Region) -> Option<NodeId> {
        let by_w = self.by_width.remove(&WidthFirst(region));
        let by_h = self.by_height.remove(&HeightFirst(region));
        assert_eq!(by_w, by_h, "free indices disagree on region {:?}", region);
        by_w
    }

    pub fn get(&self, region: &Region) -> Option<NodeId> {
        self.by_width.get(&WidthFirst(*region)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_width.len()
    }

    /// Cardinality of each map; equal unless the index is corrupted.
    pub fn lens(&self) -> (usize, usize) {
        (self.by_width.len(), self.by_height.len())
    }

    /// Find the free region that best fits a `width`x`height` request.
    ///
    /// Each map yields the first region, in its own order, that is at least
    /// as wide and as tall as requested. Of the two candidates the one with
    /// the smaller area wins; on a tie the width-first candidate is used.
    pub fn best_fit(&self, width: u32, height: u32) -> Option<(Region, NodeId)> {
        let by_width = self
            .by_width
            .range(WidthFirst::lower_bound(width)..)
            .find(|(key, _)| key.0.height >= height)
            .map(|(key, &id)| (key.0, id));
        let by_height = self
            .by_height
            .range(HeightFirst::lower_bound(height)..)
            .find(|(key, _)| key.0.width >= width)
            .map(|(key, &id)| (key.0, id));

        match (by_width, by_height) {
            (Some(w), Some(h)) if h.0.area() < w.0.area() => Some(h),
            (Some(w), _) => Some(w),
            (None, h) => h,
        }
    }

    /// Free regions in width-first order.
    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.by_width.keys().map(|key| key.0)
    }

    /// Entries of the height-first map, for consistency checks.
    pub fn height_entries(&self) -> impl Iterator<Item = (Region, NodeId)> + '_ {
        self.by_height.iter().map(|(key, &id)| (key.0, id))
    }
}

/// Index of allocated leaf regions.
#[derive(Debug, Default)]
pub(crate) struct AllocatedIndex {
    nodes: HashMap<Region, NodeId>,
}

impl AllocatedIndex {
    pub fn insert(&mut self, region: Region, id: NodeId) {
        let prev = self.nodes.insert(region, id);
        assert!(prev.is_none(), "region {:?} allocated twice", region);
    }

    pub fn remove(&mut self, region: &Region) -> Option<NodeId> {
        self.nodes.remove(region)
    }

    pub fn get(&self, region: &Region) -> Option<NodeId> {
        self.nodes.get(region).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.nodes.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles(n: u32) -> Vec<NodeId> {
        (0..n).map(NodeId::from_raw).collect()
    }

    #[test]
    fn test_best_fit_prefers_smaller_area() {
        let ids = handles(3);
        let mut index = FreeIndex::default();
        // Wide and short, narrow and tall, and a large square.
        index.insert(Region::new(0, 0, 10, 3), ids[0]);
        index.insert(Region::new(0, 3, 3, 10), ids[1]);
        index.insert(Region::new(10, 0, 20, 20), ids[2]);

        // Width-first finds 3x10, height-first finds 10x3. Equal areas, so
        // the width-first candidate is used.
        let (region, id) = index.best_fit(3, 3).unwrap();
        assert_eq!(region, Region::new(0, 3, 3, 10));
        assert_eq!(id, ids[1]);

        // Only the square is wide and tall enough.
        let (region, _) = index.best_fit(4, 4).unwrap();
        assert_eq!(region, Region::new(10, 0, 20, 20));

        assert!(index.best_fit(21, 1).is_none());
    }

    #[test]
    fn test_best_fit_height_candidate_wins() {
        let ids = handles(2);
        let mut index = FreeIndex::default();
        index.insert(Region::new(0, 0, 4, 40), ids[0]);
        index.insert(Region::new(4, 0, 6, 5), ids[1]);

        // Width-first: 4x40 (160). Height-first: 6x5 (30).
        let (region, id) = index.best_fit(4, 5).unwrap();
        assert_eq!(region, Region::new(4, 0, 6, 5));
        assert_eq!(id, ids[1]);
    }

    #[test]
    fn test_insert_remove_keep_maps_in_sync() {
        let ids = handles(2);
        let mut index = FreeIndex::default();
        index.insert(Region::new(0, 0, 2, 2), ids[0]);
        index.insert(Region::new(2, 0, 2, 2), ids[1]);
        assert_eq!(index.lens(), (2, 2));

        assert_eq!(index.remove(Region::new(0, 0, 2, 2)), Some(ids[0]));
        assert_eq!(index.lens(), (1, 1));
        assert_eq!(index.remove(Region::new(0, 0, 2, 2)), None);
        assert_eq!(index.get(&Region::new(2, 0, 2, 2)), Some(ids[1]));
    }

    #[test]
    fn test_allocated_index() {
        let ids = handles(1);
        let mut index = AllocatedIndex::default();
        assert!(index.is_empty());
        index.insert(Region::new(1, 2, 3, 4), ids[0]);
        assert_eq!(index.get(&Region::new(1, 2, 3, 4)), Some(ids[0]));
        assert_eq!(index.len(), 1);
        assert_eq!(index.remove(&Region::new(1, 2, 3, 4)), Some(ids[0]));
        assert!(index.is_empty());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_double_register_panics() {
        let ids = handles(1);
        let mut index = FreeIndex::default();
        index.insert(Region::new(0, 0, 2, 2), ids[0]);
        index.insert(Region::new(0, 0, 2, 2), ids[0]);
    }
}
