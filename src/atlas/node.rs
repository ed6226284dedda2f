//! Arena-backed space partition tree.
//!
//! Every node covers a rectangle of the surface. A node is either a leaf
//! (free or allocated) or an internal node whose 2 or 3 children exactly
//! tile its rectangle. Children point back to their parent by handle; the
//! arena owns every node and handles of removed nodes are recycled.

use crate::error::{AtlasError, Result};
use crate::types::Region;

/// Stable handle of a node inside a [`NodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

/// Child handles of a split node (2 or 3 of them).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Children {
    ids: [NodeId; 3],
    len: u8,
}

impl Children {
    pub fn as_slice(&self) -> &[NodeId] {
        &self.ids[..self.len as usize]
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub region: Region,
    pub allocated: bool,
    pub parent: Option<NodeId>,
    children: Option<Children>,
}

impl Node {
    fn leaf(region: Region, parent: Option<NodeId>) -> Self {
        Self {
            region,
            allocated: false,
            parent,
            children: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.children {
            Some(children) => children.as_slice(),
            None => &[],
        }
    }
}

/// How a free region is carved up to satisfy a request.
///
/// The exact-size region is always the first entry of [`SplitPlan::regions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SplitPlan {
    /// The region already has the requested size.
    Exact,
    Two([Region; 2]),
    Three([Region; 3]),
}

impl SplitPlan {
    /// Plan the split of `r` for a `width`x`height` request.
    ///
    /// When both sides have slack, one leftover strip spans the full extent
    /// of the longer side of `r` and the other fills the band next to the
    /// exact region:
    ///
    /// ```text
    ///  width >= height               height > width
    ///  ________________              ___________
    /// |  B   |         |            |           |
    /// |______|    C    |            |     C     |
    /// |  A   |         |            |___________|
    /// |______|_________|            |  A  |  B  |
    ///                               |_____|_____|
    /// ```
    pub fn new(r: Region, width: u32, height: u32) -> Self {
        debug_assert!(r.fits(width, height));
        let exact = Region::new(r.x, r.y, width, height);

        match (r.width > width, r.height > height) {
            (true, true) if r.width >= r.height => SplitPlan::Three([
                exact,
                Region::new(r.x, r.y + height, width, r.height - height),
                Region::new(r.x + width, r.y, r.width - width, r.height),
            ]),
            (true, true) => SplitPlan::Three([
                exact,
                Region::new(r.x + width, r.y, r.width - width, height),
                Region::new(r.x, r.y + height, r.width, r.height - height),
            ]),
            (true, false) => SplitPlan::Two([
                exact,
                Region::new(r.x + width, r.y, r.width - width, r.height),
            ]),
            (false, true) => SplitPlan::Two([
                exact,
                Region::new(r.x, r.y + height, r.width, r.height - height),
            ]),
            (false, false) => SplitPlan::Exact,
        }
    }

    pub fn regions(&self) -> &[Region] {
        match self {
            SplitPlan::Exact => &[],
            SplitPlan::Two(regions) => regions,
            SplitPlan::Three(regions) => regions,
        }
    }
}

/// Arena owning every node of the partition tree.
#[derive(Debug)]
pub(crate) struct NodeTree {
    slots: Vec<Option<Node>>,
    vacant: Vec<NodeId>,
    root: NodeId,
}

impl NodeTree {
    /// Create a tree holding a single free root leaf covering `region`.
    pub fn new(region: Region) -> Self {
        Self {
            slots: vec![Some(Node::leaf(region, None))],
            vacant: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub fn get(&self, id: NodeId) -> &Node {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("stale node handle {:?}", id),
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("stale node handle {:?}", id),
        }
    }

    fn insert(&mut self, node: Node) -> NodeId {
        match self.vacant.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                let id = NodeId(self.slots.len() as u32);
                self.slots.push(Some(node));
                id
            }
        }
    }

    fn remove(&mut self, id: NodeId) -> Node {
        match self.slots.get_mut(id.index()).and_then(Option::take) {
            Some(node) => {
                self.vacant.push(id);
                node
            }
            None => panic!("stale node handle {:?}", id),
        }
    }

    /// Turn the free leaf `id` into an internal node with one free leaf
    /// child per entry of `regions`.
    pub fn split(&mut self, id: NodeId, regions: &[Region]) -> Children {
        let node = self.get(id);
        assert!(node.is_leaf(), "node {:?} already has children", id);
        assert!(!node.allocated, "allocated node {:?} can't be split", id);
        assert!(
            (2..=3).contains(&regions.len()),
            "a node is split into 2 or 3 children, got {}",
            regions.len()
        );
        debug_assert_eq!(
            regions.iter().map(Region::area).sum::<u64>(),
            node.region.area(),
            "children must cover the area of the parent"
        );

        let mut ids = [id; 3];
        for (slot, region) in ids.iter_mut().zip(regions) {
            debug_assert!(!region.is_empty());
            *slot = self.insert(Node::leaf(*region, Some(id)));
        }
        let children = Children {
            ids,
            len: regions.len() as u8,
        };
        self.get_mut(id).children = Some(children);

        tracing::trace!(parent = ?self.get(id).region, children = regions.len(), "split node");
        children
    }

    /// Check whether every child of `id` is a free leaf.
    pub fn can_merge_children(&self, id: NodeId) -> bool {
        let node = self.get(id);
        !node.is_leaf()
            && node.children().iter().all(|&child| {
                let child = self.get(child);
                child.is_leaf() && !child.allocated
            })
    }

    /// Collapse the children of `id` back into a single free leaf. The
    /// inverse of [`NodeTree::split`].
    pub fn merge_children(&mut self, id: NodeId) {
        assert!(
            self.can_merge_children(id),
            "children of {:?} are not all free leaves",
            id
        );
        if let Some(children) = self.get_mut(id).children.take() {
            for &child in children.as_slice() {
                self.remove(child);
            }
        }
        tracing::trace!(region = ?self.get(id).region, "merged children");
    }

    /// Verify that the children of `id` tile its region exactly and point
    /// back at it.
    pub fn check_partition(&self, id: NodeId) -> Result<()> {
        let node = self.get(id);
        if node.region.is_empty() {
            return Err(AtlasError::Inconsistent(format!(
                "node {:?} has an empty region",
                id
            )));
        }
        if node.is_leaf() {
            return Ok(());
        }
        if node.allocated {
            return Err(AtlasError::Inconsistent(format!(
                "allocated node {:?} has children",
                id
            )));
        }

        let children = node.children();
        let mut area = 0u64;
        for (i, &child_id) in children.iter().enumerate() {
            let child = self.get(child_id);
            if child.parent != Some(id) {
                return Err(AtlasError::Inconsistent(format!(
                    "child {:?} of {:?} points at parent {:?}",
                    child_id, id, child.parent
                )));
            }
            if !node.region.contains(&child.region) {
                return Err(AtlasError::Inconsistent(format!(
                    "child region {:?} is outside parent region {:?}",
                    child.region, node.region
                )));
            }
            for &other_id in &children[i + 1..] {
                let other = self.get(other_id);
                if child.region.intersects(&other.region) {
                    return Err(AtlasError::Inconsistent(format!(
                        "sibling regions {:?} and {:?} overlap",
                        child.region, other.region
                    )));
                }
            }
            area += child.region.area();
        }

        if area != node.region.area() {
            return Err(AtlasError::Inconsistent(format!(
                "children of {:?} cover {} units instead of {}",
                node.region,
                area,
                node.region.area()
            )));
        }
        Ok(())
    }
}
