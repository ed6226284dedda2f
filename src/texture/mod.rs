//! CPU-side bookkeeping for a dynamic texture atlas.
//!
//! The atlas hands out [`Suballocation`]s from one or more slices of a
//! texture (a single 2D texture or a growing 2D array). Requests are rounded
//! up to a power-of-two alignment and every alignment gets its own batch of
//! slices, each managed by an [`AtlasManager`] working in alignment units.
//! Slices that become empty are released and their index reused.
//!
//! No GPU objects are owned here; the caller creates or resizes the texture
//! to [`DynamicTextureAtlas::array_size`] slices before uploading.

mod config;
mod suballocation;

pub use config::{AtlasDimension, TextureAtlasConfig, MAX_SLICE_COUNT};
pub use suballocation::Suballocation;

use crate::atlas::AtlasManager;
use crate::error::{AtlasError, Result};
use glam::UVec2;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Allocation statistics of a [`DynamicTextureAtlas`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    /// Texel area of all slices currently in the texture.
    pub total_area: u64,
    /// Number of live suballocations.
    pub allocation_count: u32,
    /// Texel area that was requested.
    pub allocated_area: u64,
    /// Texel area reserved after alignment.
    pub used_area: u64,
}

/// Slices of one alignment, ordered by slice index.
#[derive(Debug)]
struct SliceBatch {
    width: u32,
    height: u32,
    slices: BTreeMap<u32, AtlasManager>,
}

/// Slice indices not claimed by any batch, plus the logical array size.
#[derive(Debug)]
struct SlicePool {
    available: BTreeSet<u32>,
    array_size: u32,
    extra_slice_count: u32,
    max_slice_count: u32,
}

impl SlicePool {
    /// Claim the lowest free slice index, growing the array to hold it.
    fn claim(&mut self) -> Option<u32> {
        let slice = self.available.pop_first()?;
        while self.array_size <= slice {
            let extra = if self.extra_slice_count != 0 {
                self.extra_slice_count
            } else {
                self.array_size.max(1)
            };
            self.array_size = (self.array_size + extra).min(self.max_slice_count);
            tracing::debug!(array_size = self.array_size, "grew texture array");
        }
        Some(slice)
    }

    fn recycle(&mut self, slice: u32) {
        let inserted = self.available.insert(slice);
        assert!(inserted, "slice {} is already available", slice);
    }
}

/// A texture atlas that grows and shrinks with its allocations.
#[derive(Debug)]
pub struct DynamicTextureAtlas {
    config: TextureAtlasConfig,
    batches: HashMap<u32, SliceBatch>,
    pool: SlicePool,
    stats: UsageStats,
}

impl DynamicTextureAtlas {
    /// Create an atlas after validating its configuration.
    pub fn new(config: TextureAtlasConfig) -> Result<Self> {
        config.validate()?;

        let max_slice_count = config.max_slices();
        let array_size = match config.dimension {
            AtlasDimension::Texture2D => 1,
            AtlasDimension::Texture2DArray => config.array_size.min(max_slice_count),
        };

        tracing::debug!(
            name = %config.name,
            width = config.width,
            height = config.height,
            max_slice_count,
            "created dynamic texture atlas"
        );

        Ok(Self {
            pool: SlicePool {
                available: (0..max_slice_count).collect(),
                array_size,
                extra_slice_count: config.extra_slice_count,
                max_slice_count,
            },
            config,
            batches: HashMap::new(),
            stats: UsageStats::default(),
        })
    }

    pub fn config(&self) -> &TextureAtlasConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Number of slices the backing texture needs.
    pub fn array_size(&self) -> u32 {
        self.pool.array_size
    }

    /// Number of slices holding at least one allocation.
    pub fn slice_count(&self) -> usize {
        self.batches.values().map(|b| b.slices.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.allocation_count == 0
    }

    pub fn usage_stats(&self) -> UsageStats {
        let slice_area = u64::from(self.config.width) * u64::from(self.config.height);
        let total_area = match self.config.dimension {
            AtlasDimension::Texture2D => slice_area,
            AtlasDimension::Texture2DArray => slice_area * u64::from(self.pool.array_size),
        };
        UsageStats {
            total_area,
            ..self.stats
        }
    }

    /// Alignment used for a `width`x`height` request: the minimum alignment
    /// doubled until it reaches the shorter side of the request.
    pub fn alignment_for(&self, width: u32, height: u32) -> u32 {
        if self.config.min_alignment == 0 {
            return 1;
        }
        let shorter = width.min(height);
        let mut alignment = self.config.min_alignment;
        while shorter > alignment {
            alignment = alignment.saturating_mul(2);
        }
        alignment
    }

    /// Allocate a `width`x`height` region from the first slice with room,
    /// claiming a new slice when the existing ones are full.
    pub fn allocate(&mut self, width: u32, height: u32) -> Result<Suballocation> {
        if width == 0 || height == 0 {
            return Err(AtlasError::ZeroSizedRequest);
        }

        let alignment = self.alignment_for(width, height);
        let aligned_width = width.div_ceil(alignment).saturating_mul(alignment);
        let aligned_height = height.div_ceil(alignment).saturating_mul(alignment);
        if aligned_width > self.config.width || aligned_height > self.config.height {
            tracing::warn!(
                atlas = %self.config.name,
                width,
                height,
                alignment,
                "requested region exceeds atlas dimensions"
            );
            return Err(AtlasError::RequestTooLarge {
                width,
                height,
                atlas_width: self.config.width,
                atlas_height: self.config.height,
            });
        }

        let batch = self
            .batches
            .entry(alignment)
            .or_insert_with(|| SliceBatch {
                width: self.config.width / alignment,
                height: self.config.height / alignment,
                slices: BTreeMap::new(),
            });

        let mut placed = None;
        let mut slice = 0;
        while slice < self.pool.max_slice_count {
            let index = match batch.slices.range(slice..).next() {
                Some((&index, _)) => index,
                None => match self.pool.claim() {
                    Some(index) => index,
                    None => break,
                },
            };

            let (batch_width, batch_height) = (batch.width, batch.height);
            let manager = batch
                .slices
                .entry(index)
                .or_insert_with(|| AtlasManager::new(batch_width, batch_height));
            let region = manager.allocate(aligned_width / alignment, aligned_height / alignment);
            if !region.is_empty() {
                placed = Some((index, region));
                break;
            }

            // Failed to allocate the region - try the next slice
            slice = index + 1;
        }

        let Some((slice, subregion)) = placed else {
            if !self.config.silent {
                tracing::warn!(
                    atlas = %self.config.name,
                    width,
                    height,
                    "failed to suballocate texture region"
                );
            }
            return Err(AtlasError::OutOfSpace { width, height });
        };

        self.stats.allocation_count += 1;
        self.stats.allocated_area += u64::from(width) * u64::from(height);
        self.stats.used_area += u64::from(aligned_width) * u64::from(aligned_height);

        Ok(Suballocation {
            subregion,
            slice,
            alignment,
            size: UVec2::new(width, height),
        })
    }

    /// Give a suballocation back. A slice left empty is released.
    ///
    /// # Panics
    ///
    /// Panics if the suballocation was not made by this atlas.
    pub fn free(&mut self, suballocation: Suballocation) {
        let Suballocation {
            subregion,
            slice,
            alignment,
            size,
        } = suballocation;

        let Some(batch) = self.batches.get_mut(&alignment) else {
            panic!(
                "there are no slices with alignment {}; the suballocation was freed twice or \
                 belongs to another atlas",
                alignment
            );
        };
        let Some(manager) = batch.slices.get_mut(&slice) else {
            panic!("slice {} is not found in the batch with alignment {}", slice, alignment);
        };

        manager.free(subregion);
        if manager.is_empty() {
            if let Some(manager) = batch.slices.remove(&slice) {
                manager.destroy();
            }
            self.pool.recycle(slice);
            tracing::debug!(slice, alignment, "released empty slice");
        }

        self.stats.allocation_count -= 1;
        self.stats.allocated_area -= u64::from(size.x) * u64::from(size.y);
        self.stats.used_area -= subregion.area() * u64::from(alignment) * u64::from(alignment);
    }
}

impl Drop for DynamicTextureAtlas {
    fn drop(&mut self) {
        if !self.is_empty() && !std::thread::panicking() {
            tracing::warn!(
                atlas = %self.config.name,
                live = self.stats.allocation_count,
                "dynamic texture atlas dropped with live suballocations"
            );
        }
    }
}
