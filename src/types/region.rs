//! Axis-aligned integer rectangles and their canonical index orderings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An axis-aligned rectangle with an integer origin and extent.
///
/// A region with zero width or height is "empty"; the allocator returns an
/// empty region to signal that a request could not be satisfied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The distinguished "no region" value.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Area in units, widened so full-size surfaces cannot overflow.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// Exclusive far edge along y.
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// Check whether the two regions share any area.
    pub fn intersects(&self, other: &Region) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && u64::from(self.x) < other.right()
            && u64::from(other.x) < self.right()
            && u64::from(self.y) < other.bottom()
            && u64::from(other.y) < self.bottom()
    }

    /// Check whether `other` lies entirely inside this region.
    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check whether a `width`x`height` request fits inside this region.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width >= width && self.height >= height
    }
}

/// Width-first ordering key: `(width, height, x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidthFirst(pub Region);

impl WidthFirst {
    /// Smallest key whose width is at least `width`.
    pub(crate) fn lower_bound(width: u32) -> Self {
        Self(Region::new(0, 0, width, 0))
    }
}

impl Ord for WidthFirst {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.0, &other.0);
        (a.width, a.height, a.x, a.y).cmp(&(b.width, b.height, b.x, b.y))
    }
}

impl PartialOrd for WidthFirst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Height-first ordering key: `(height, width, y, x)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeightFirst(pub Region);

impl HeightFirst {
    /// Smallest key whose height is at least `height`.
    pub(crate) fn lower_bound(height: u32) -> Self {
        Self(Region::new(0, 0, 0, height))
    }
}

impl Ord for HeightFirst {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.0, &other.0);
        (a.height, a.width, a.y, a.x).cmp(&(b.height, b.width, b.y, b.x))
    }
}

impl PartialOrd for HeightFirst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
