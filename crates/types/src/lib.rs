//! Value types shared across the crowdmap crates.

pub mod color;
pub mod level;

pub use color::{ParseRgbError, Rgb};
pub use level::{CongestionLevel, LevelInput, LevelOutOfRange};
