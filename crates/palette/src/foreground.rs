//! Foreground (text) color rules paired with each palette.
//!
//! Rules are hand-picked per palette rather than derived from background
//! luminance: every palette states which levels get light text and which get
//! dark text.

use crowdmap_types::{CongestionLevel, Rgb};

/// Text color used on dark backgrounds.
pub const LIGHT_TEXT: Rgb = Rgb::WHITE;
/// Text color used on light backgrounds.
pub const DARK_TEXT: Rgb = Rgb::BLACK;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRule {
    /// Light text at or above `threshold`, dark below it. When `inverted`,
    /// light text below `threshold` and dark text at or above it.
    Threshold { threshold: u8, inverted: bool },
    /// Dark text for levels inside any inclusive range, light text elsewhere.
    DarkRanges(&'static [(u8, u8)]),
}

impl TextRule {
    pub fn foreground(&self, level: CongestionLevel) -> Rgb {
        let value = level.get();
        let light = match *self {
            TextRule::Threshold { threshold, inverted: false } => value >= threshold,
            TextRule::Threshold { threshold, inverted: true } => value < threshold,
            TextRule::DarkRanges(ranges) => !ranges.iter().any(|&(low, high)| (low..=high).contains(&value)),
        };
        if light { LIGHT_TEXT } else { DARK_TEXT }
    }
}
