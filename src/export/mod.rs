//! Debug exports of allocator state.
//!
//! Both exports describe results for humans and tools; neither can be
//! loaded back into an allocator.

pub mod png;
pub mod report;

pub use png::{render_layout, render_layout_png};
pub use report::{Placement, PlacementReport};
