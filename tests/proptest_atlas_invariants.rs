//! Property-based invariant tests for the atlas allocator.
//!
//! After any sequence of allocations and frees:
//!
//! 1. `verify` succeeds.
//! 2. Free and allocated regions tile the surface exactly once.
//! 3. Free area plus allocated area equals the surface area.
//! 4. Successful allocations have exactly the requested size.
//! 5. `is_empty` agrees with the allocated count.
//! 6. Allocating then immediately freeing restores the free set.
//! 7. Freeing everything, in any order, leaves one free region.

use dynamic_atlas::{AtlasManager, Region};
use proptest::prelude::*;

const WIDTH: u32 = 32;
const HEIGHT: u32 = 24;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Alloc(u32, u32),
    /// Index into the live list, taken modulo its length.
    Free(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1u32..=12, 1u32..=12).prop_map(|(w, h)| Op::Alloc(w, h)),
        2 => any::<usize>().prop_map(Op::Free),
    ]
}

fn sizes_strategy() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((1u32..=10, 1u32..=10), 1..12)
}

fn sorted_free(atlas: &AtlasManager) -> Vec<Region> {
    let mut regions: Vec<_> = atlas.free_regions().collect();
    regions.sort_by_key(|r| (r.x, r.y, r.width, r.height));
    regions
}

/// Run `ops`, returning the manager and the live allocations.
fn replay(ops: &[Op]) -> (AtlasManager, Vec<Region>) {
    let mut atlas = AtlasManager::new(WIDTH, HEIGHT);
    let mut live = Vec::new();
    for op in ops {
        match *op {
            Op::Alloc(w, h) => {
                let region = atlas.allocate(w, h);
                if !region.is_empty() {
                    live.push(region);
                }
            }
            Op::Free(i) if !live.is_empty() => {
                let region = live.swap_remove(i % live.len());
                atlas.free(region);
            }
            Op::Free(_) => {}
        }
    }
    (atlas, live)
}

fn check_state(atlas: &AtlasManager, live: &[Region]) -> Result<(), TestCaseError> {
    if let Err(err) = atlas.verify() {
        return Err(TestCaseError::fail(err.to_string()));
    }

    let mut coverage = vec![0u8; (WIDTH * HEIGHT) as usize];
    for region in atlas.free_regions().chain(atlas.allocated_regions()) {
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                coverage[(y * WIDTH + x) as usize] += 1;
            }
        }
    }
    prop_assert!(
        coverage.iter().all(|&c| c == 1),
        "surface is not tiled exactly once"
    );

    let allocated_area: u64 = live.iter().map(Region::area).sum();
    prop_assert_eq!(
        atlas.total_free_area() + allocated_area,
        u64::from(WIDTH) * u64::from(HEIGHT)
    );
    prop_assert_eq!(atlas.allocated_region_count(), live.len());
    prop_assert_eq!(atlas.is_empty(), live.is_empty());
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1-5. Structural invariants hold after every operation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn invariants_hold_after_every_op(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut atlas = AtlasManager::new(WIDTH, HEIGHT);
        let mut live = Vec::new();
        for op in &ops {
            match *op {
                Op::Alloc(w, h) => {
                    let region = atlas.allocate(w, h);
                    if !region.is_empty() {
                        prop_assert_eq!((region.width, region.height), (w, h));
                        prop_assert!(region.right() <= u64::from(WIDTH));
                        prop_assert!(region.bottom() <= u64::from(HEIGHT));
                        live.push(region);
                    }
                }
                Op::Free(i) if !live.is_empty() => {
                    let region = live.swap_remove(i % live.len());
                    atlas.free(region);
                }
                Op::Free(_) => {}
            }
            check_state(&atlas, &live)?;
        }
        for region in live.drain(..) {
            atlas.free(region);
        }
        atlas.destroy();
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Allocate then free is a no-op on the free set
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn allocate_then_free_round_trips(
        ops in prop::collection::vec(op_strategy(), 0..40),
        w in 1u32..=12,
        h in 1u32..=12,
    ) {
        let (mut atlas, live) = replay(&ops);
        let before = sorted_free(&atlas);
        let nodes = atlas.node_count();

        let region = atlas.allocate(w, h);
        if !region.is_empty() {
            atlas.free(region);
        }

        prop_assert_eq!(sorted_free(&atlas), before);
        prop_assert_eq!(atlas.node_count(), nodes);
        check_state(&atlas, &live)?;
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Full release in any order coalesces to the surface
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn any_free_order_coalesces(
        (sizes, order) in sizes_strategy().prop_flat_map(|sizes| {
            let indices: Vec<usize> = (0..sizes.len()).collect();
            (Just(sizes), Just(indices).prop_shuffle())
        })
    ) {
        let mut atlas = AtlasManager::new(WIDTH, HEIGHT);
        let regions: Vec<_> = sizes.iter().map(|&(w, h)| atlas.allocate(w, h)).collect();

        for i in order {
            if !regions[i].is_empty() {
                atlas.free(regions[i]);
            }
        }

        prop_assert!(atlas.is_empty());
        prop_assert_eq!(sorted_free(&atlas), vec![Region::new(0, 0, WIDTH, HEIGHT)]);
        prop_assert_eq!(atlas.node_count(), 1);
        atlas.destroy();
    }
}
