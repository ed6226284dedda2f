//! The dynamic atlas manager.

use super::index::{AllocatedIndex, FreeIndex};
use super::node::{NodeId, NodeTree, SplitPlan};
use crate::error::{AtlasError, Result};
use crate::types::Region;

/// Hands out non-overlapping sub-rectangles of a fixed-size surface and
/// takes them back, coalescing freed space with its siblings.
///
/// `allocate` returns an empty [`Region`] when no free space is large
/// enough; that is a normal outcome the caller has to check for. Freeing a
/// region that is not currently allocated is a bug in the caller and
/// panics (see [`AtlasManager::try_free`] for the fallible form).
///
/// The manager is not internally synchronized; wrap it in a lock to share
/// it between threads.
#[derive(Debug)]
pub struct AtlasManager {
    width: u32,
    height: u32,
    tree: NodeTree,
    free: FreeIndex,
    allocated: AllocatedIndex,
    total_free_area: u64,
}

impl AtlasManager {
    /// Create a manager for a `width`x`height` surface.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "atlas dimensions must not be zero ({}x{})",
            width,
            height
        );

        let surface = Region::new(0, 0, width, height);
        let tree = NodeTree::new(surface);
        let mut free = FreeIndex::default();
        free.insert(surface, tree.root());

        Self {
            width,
            height,
            tree,
            free,
            allocated: AllocatedIndex::default(),
            total_free_area: surface.area(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of free leaf regions.
    pub fn free_region_count(&self) -> usize {
        self.free.len()
    }

    /// Number of live allocations.
    pub fn allocated_region_count(&self) -> usize {
        self.allocated.len()
    }

    /// Sum of the areas of all free regions.
    pub fn total_free_area(&self) -> u64 {
        self.total_free_area
    }

    /// Check whether nothing is allocated.
    pub fn is_empty(&self) -> bool {
        self.allocated.is_empty()
    }

    /// Number of nodes currently in the partition tree.
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    /// Free leaf regions, narrowest first.
    pub fn free_regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.free.regions()
    }

    /// Allocated regions in no particular order.
    pub fn allocated_regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.allocated.regions()
    }

    /// Allocate a `width`x`height` region.
    ///
    /// Returns an empty region if no free region is large enough.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn allocate(&mut self, width: u32, height: u32) -> Region {
        assert!(
            width > 0 && height > 0,
            "requested region size must not be zero ({}x{})",
            width,
            height
        );

        let Some((source, id)) = self.free.best_fit(width, height) else {
            tracing::debug!(width, height, free_area = self.total_free_area, "no free region large enough");
            return Region::empty();
        };
        self.unregister(id);

        let plan = SplitPlan::new(source, width, height);
        let target = match plan {
            SplitPlan::Exact => id,
            _ => {
                let children = self.tree.split(id, plan.regions());
                for &leftover in &children.as_slice()[1..] {
                    self.register(leftover);
                }
                children.as_slice()[0]
            }
        };

        self.tree.get_mut(target).allocated = true;
        self.register(target);

        let region = self.tree.get(target).region;
        debug_assert_eq!((region.width, region.height), (width, height));
        self.total_free_area -= region.area();

        tracing::debug!(?region, ?source, "allocated region");
        region
    }

    /// Free a region previously returned by [`AtlasManager::allocate`].
    ///
    /// # Panics
    ///
    /// Panics if the region is not currently allocated by this manager.
    pub fn free(&mut self, region: Region) {
        if let Err(err) = self.try_free(region) {
            panic!("{}", err);
        }
    }

    /// Free a region, reporting unknown and double frees as
    /// [`AtlasError::NotAllocated`]. The manager is left untouched on error.
    pub fn try_free(&mut self, region: Region) -> Result<()> {
        let Some(id) = self.allocated.remove(&region) else {
            return Err(AtlasError::NotAllocated(region));
        };

        self.tree.get_mut(id).allocated = false;
        self.register(id);
        self.total_free_area += region.area();

        let mut merges = 0usize;
        let mut parent = self.tree.get(id).parent;
        while let Some(pid) = parent {
            if !self.tree.can_merge_children(pid) {
                break;
            }
            for &child in self.tree.get(pid).children() {
                let removed = self.free.remove(self.tree.get(child).region);
                debug_assert_eq!(removed, Some(child));
            }
            self.tree.merge_children(pid);
            self.register(pid);
            merges += 1;
            parent = self.tree.get(pid).parent;
        }

        tracing::debug!(?region, merges, "freed region");
        Ok(())
    }

    /// Tear the manager down.
    ///
    /// # Panics
    ///
    /// Panics if any region is still allocated.
    pub fn destroy(self) {
        assert!(
            self.is_empty(),
            "atlas manager destroyed with {} live allocations",
            self.allocated.len()
        );
        debug_assert_eq!(self.tree.len(), 1, "empty atlas must collapse to its root");
    }

    /// Walk the whole tree and check it against the indices and counters.
    ///
    /// This is O(n) and meant for tests; `allocate` and `free` never call it.
    pub fn verify(&self) -> Result<()> {
        let (by_width, by_height) = self.free.lens();
        if by_width != by_height {
            return inconsistent(format!(
                "free indices hold {} and {} regions",
                by_width, by_height
            ));
        }
        for (region, id) in self.free.height_entries() {
            if self.free.get(&region) != Some(id) {
                return inconsistent(format!(
                    "free region {:?} maps to different nodes in the two indices",
                    region
                ));
            }
        }

        let root = self.tree.root();
        let surface = Region::new(0, 0, self.width, self.height);
        if self.tree.get(root).region != surface || self.tree.get(root).parent.is_some() {
            return inconsistent(format!("root does not cover the surface {:?}", surface));
        }

        let mut visited = 0usize;
        let mut free_leaves = 0usize;
        let mut allocated_leaves = 0usize;
        let mut free_area = 0u64;
        let mut allocated_area = 0u64;

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            visited += 1;
            self.tree.check_partition(id)?;

            let node = self.tree.get(id);
            if !node.is_leaf() {
                if self.free.get(&node.region) == Some(id) {
                    return inconsistent(format!(
                        "internal node {:?} is registered as free",
                        node.region
                    ));
                }
                if self.tree.can_merge_children(id) {
                    return inconsistent(format!(
                        "children of {:?} are all free but were not merged",
                        node.region
                    ));
                }
                stack.extend_from_slice(node.children());
                continue;
            }

            let in_free = self.free.get(&node.region) == Some(id);
            let in_allocated = self.allocated.get(&node.region) == Some(id);
            if node.allocated {
                if !in_allocated || in_free {
                    return inconsistent(format!(
                        "allocated leaf {:?} is registered incorrectly",
                        node.region
                    ));
                }
                allocated_leaves += 1;
                allocated_area += node.region.area();
            } else {
                if !in_free || in_allocated {
                    return inconsistent(format!(
                        "free leaf {:?} is registered incorrectly",
                        node.region
                    ));
                }
                free_leaves += 1;
                free_area += node.region.area();
            }
        }

        if visited != self.tree.len() {
            return inconsistent(format!(
                "{} nodes reachable from the root but {} alive",
                visited,
                self.tree.len()
            ));
        }
        if free_leaves != self.free.len() || allocated_leaves != self.allocated.len() {
            return inconsistent(format!(
                "tree has {} free and {} allocated leaves, indices hold {} and {}",
                free_leaves,
                allocated_leaves,
                self.free.len(),
                self.allocated.len()
            ));
        }
        let indexed_free_area: u64 = self.free.regions().map(|r| r.area()).sum();
        if free_area != self.total_free_area || indexed_free_area != self.total_free_area {
            return inconsistent(format!(
                "total free area is {} but free leaves cover {}",
                self.total_free_area, free_area
            ));
        }
        if free_area + allocated_area != surface.area() {
            return inconsistent(format!(
                "leaves cover {} units of a {} unit surface",
                free_area + allocated_area,
                surface.area()
            ));
        }
        Ok(())
    }

    fn register(&mut self, id: NodeId) {
        let node = self.tree.get(id);
        assert!(node.is_leaf(), "only leaves can be registered");
        if node.allocated {
            self.allocated.insert(node.region, id);
        } else {
            self.free.insert(node.region, id);
        }
    }

    fn unregister(&mut self, id: NodeId) {
        let node = self.tree.get(id);
        let removed = if node.allocated {
            self.allocated.remove(&node.region)
        } else {
            self.free.remove(node.region)
        };
        assert_eq!(removed, Some(id), "node {:?} was not registered", node.region);
    }
}

impl Drop for AtlasManager {
    fn drop(&mut self) {
        if !self.allocated.is_empty() && !std::thread::panicking() {
            tracing::warn!(
                live = self.allocated.len(),
                "atlas manager dropped with live allocations"
            );
        }
    }
}

fn inconsistent(message: String) -> Result<()> {
    Err(AtlasError::Inconsistent(message))
}
