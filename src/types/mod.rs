//! Shared types used throughout the library.

mod region;

pub use region::{HeightFirst, Region, WidthFirst};
