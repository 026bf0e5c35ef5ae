//! Static catalog of congestion palettes.
//!
//! Every palette maps the ten congestion levels to a background color and
//! carries a hand-picked [`TextRule`] for the matching foreground. The table
//! is ordered the way the selector UI lists palettes, and the order of
//! [`PALETTE_DEFINITIONS`] must match the discriminants of [`PaletteId`];
//! both invariants are checked at compile time below.

use std::fmt;
use std::str::FromStr;

use crowdmap_types::{CongestionLevel, LevelInput, Rgb};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PaletteError;
use crate::foreground::TextRule;

/// Color returned for missing or out-of-range levels ("no data").
pub const SENTINEL_COLOR: Rgb = Rgb::WHITE;

/// Identifier of a selectable palette.
///
/// The canonical string form (see [`PaletteId::as_str`]) is what gets
/// persisted, so it must never change for an existing variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaletteId {
    GreenYellowRedOne,
    GreenYellowRed,
    WhiteRed,
    PasteleOne,
    PasteleTwo,
    PasteleThree,
    BlueToRed,
    ViridisReverse,
    WhiteToBlue,
    RdYlBuReversed,
    Jet,
    Turbo,
    Grads,
    CmThermal,
    GreenToRed,
    Viridis,
}

impl PaletteId {
    /// Number of palettes in the catalog.
    pub const COUNT: usize = 16;

    /// Palette used when nothing (valid) has been stored.
    pub const DEFAULT: PaletteId = PaletteId::GreenYellowRed;

    /// All identifiers in catalog order.
    pub const ALL: [PaletteId; PaletteId::COUNT] = [
        PaletteId::GreenYellowRedOne,
        PaletteId::GreenYellowRed,
        PaletteId::WhiteRed,
        PaletteId::PasteleOne,
        PaletteId::PasteleTwo,
        PaletteId::PasteleThree,
        PaletteId::BlueToRed,
        PaletteId::ViridisReverse,
        PaletteId::WhiteToBlue,
        PaletteId::RdYlBuReversed,
        PaletteId::Jet,
        PaletteId::Turbo,
        PaletteId::Grads,
        PaletteId::CmThermal,
        PaletteId::GreenToRed,
        PaletteId::Viridis,
    ];

    /// Canonical identifier used for persistence.
    pub const fn as_str(self) -> &'static str {
        match self {
            PaletteId::GreenYellowRedOne => "GREEN_YELLOW_RED_ONE",
            PaletteId::GreenYellowRed => "GREEN_YELLOW_RED",
            PaletteId::WhiteRed => "WHITE_RED",
            PaletteId::PasteleOne => "PASTELE_ONE",
            PaletteId::PasteleTwo => "PASTELE_TWO",
            PaletteId::PasteleThree => "PASTELE_THREE",
            PaletteId::BlueToRed => "BLUE_TO_RED",
            PaletteId::ViridisReverse => "VIRIDIS_REVERSE",
            PaletteId::WhiteToBlue => "WHITE_TO_BLUE",
            PaletteId::RdYlBuReversed => "RDYLBU_R",
            PaletteId::Jet => "JET",
            PaletteId::Turbo => "TURBO",
            PaletteId::Grads => "GRADS",
            PaletteId::CmThermal => "CMTHERMAL",
            PaletteId::GreenToRed => "GREEN_TO_RED",
            PaletteId::Viridis => "VIRIDIS",
        }
    }

    /// The catalog entry for this identifier.
    pub fn definition(self) -> &'static PaletteDefinition {
        &PALETTE_DEFINITIONS[self as usize]
    }
}

impl fmt::Display for PaletteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaletteId {
    type Err = PaletteError;

    /// Accepts only the canonical ids listed by [`PaletteId::as_str`]. Use
    /// [`resolve`] for user-typed names.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        PaletteId::ALL
            .into_iter()
            .find(|id| id.as_str() == name)
            .ok_or_else(|| PaletteError::InvalidPaletteId(name.to_string()))
    }
}

impl Serialize for PaletteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PaletteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Describes one selectable palette.
#[derive(Clone, Copy, Debug)]
pub struct PaletteDefinition {
    pub id: PaletteId,
    /// Human-friendly display name.
    pub label: &'static str,
    /// Short description rendered next to the swatch.
    pub description: &'static str,
    /// Background colors for levels 1 through 10.
    pub colors: [Rgb; CongestionLevel::COUNT],
    /// Foreground selection for each level.
    pub text_rule: TextRule,
    /// Alternate spellings accepted by [`resolve`].
    pub aliases: &'static [&'static str],
}

impl PaletteDefinition {
    /// Background color for a validated level.
    pub const fn color_at(&self, level: CongestionLevel) -> Rgb {
        self.colors[level.index()]
    }

    /// Background color for a raw level, or [`SENTINEL_COLOR`] for "no data".
    pub fn color(&self, level: impl LevelInput) -> Rgb {
        level.to_congestion_level().map_or(SENTINEL_COLOR, |level| self.color_at(level))
    }

    /// Foreground color for a raw level, or [`SENTINEL_COLOR`] for "no data".
    pub fn text_color(&self, level: impl LevelInput) -> Rgb {
        level
            .to_congestion_level()
            .map_or(SENTINEL_COLOR, |level| self.text_rule.foreground(level))
    }

    /// Swatch colors for levels 1 through 10.
    pub fn sample_colors(&self) -> [Rgb; CongestionLevel::COUNT] {
        self.colors
    }

    fn matches(&self, normalized: &str) -> bool {
        self.id.as_str() == normalized || self.aliases.iter().any(|alias| *alias == normalized)
    }
}

const fn table(packed: [u32; CongestionLevel::COUNT]) -> [Rgb; CongestionLevel::COUNT] {
    let mut colors = [Rgb::BLACK; CongestionLevel::COUNT];
    let mut index = 0;
    while index < CongestionLevel::COUNT {
        colors[index] = Rgb::from_hex(packed[index]);
        index += 1;
    }
    colors
}

/// Levels 3 through 8 carry dark text; both ends of the ramp carry light text.
const MIDDLE_DARK: &[(u8, u8)] = &[(3, 8)];

/// Ordered list of selectable palettes.
pub const PALETTE_DEFINITIONS: &[PaletteDefinition; PaletteId::COUNT] = &[
    PaletteDefinition {
        id: PaletteId::GreenYellowRedOne,
        label: "Green → Yellow → Red",
        description: "Soft green through amber to coral.",
        colors: table([
            0xe4f6d7, 0xeff6be, 0xf9f5a6, 0xffee90, 0xffd069, 0xffbd50, 0xfeac42, 0xf98345, 0xf66846, 0xf25444,
        ]),
        text_rule: TextRule::Threshold { threshold: 11, inverted: false },
        aliases: &[],
    },
    PaletteDefinition {
        id: PaletteId::GreenYellowRed,
        label: "White → Yellow → Red",
        description: "Cream through saturated orange to deep red. Default.",
        colors: table([
            0xf9f1dc, 0xe1ed8a, 0xffee90, 0xffdd50, 0xffd069, 0xf6ac0c, 0xf28b06, 0xe35911, 0xd84b35, 0xc61a1a,
        ]),
        text_rule: TextRule::Threshold { threshold: 7, inverted: false },
        aliases: &[],
    },
    PaletteDefinition {
        id: PaletteId::WhiteRed,
        label: "White → Red",
        description: "Warm single-hue ramp ending in brick red.",
        colors: table([
            0xfcf7eb, 0xfff1b6, 0xfee666, 0xffd110, 0xffbc00, 0xff9d00, 0xf27111, 0xd3542d, 0xc61a1a, 0x9e2e2e,
        ]),
        text_rule: TextRule::Threshold { threshold: 6, inverted: false },
        aliases: &[],
    },
    PaletteDefinition {
        id: PaletteId::PasteleOne,
        label: "Pastel I",
        description: "Pale blue through pastel green and yellow to salmon.",
        colors: table([
            0xf8fcff, 0xddf2fd, 0xaed6f4, 0xc8eabb, 0xffeb88, 0xffdf57, 0xffc271, 0xf49758, 0xf48678, 0xd85645,
        ]),
        text_rule: TextRule::DarkRanges(MIDDLE_DARK),
        aliases: &["PASTEL_ONE"],
    },
    PaletteDefinition {
        id: PaletteId::PasteleTwo,
        label: "Pastel II",
        description: "Sky blue start with the Pastel I warm end.",
        colors: table([
            0xa3cbef, 0xa9dbeb, 0xb0dd9f, 0xe1ed8a, 0xffeb88, 0xfcd170, 0xffc271, 0xf49758, 0xf48678, 0xd85645,
        ]),
        text_rule: TextRule::DarkRanges(MIDDLE_DARK),
        aliases: &["PASTEL_TWO"],
    },
    PaletteDefinition {
        id: PaletteId::PasteleThree,
        label: "Pastel III",
        description: "Indigo through mint and apricot to crimson.",
        colors: table([
            0x4457a5, 0x77beed, 0xb0e5ff, 0xa3e09b, 0xd9f0a3, 0xfee08b, 0xffb061, 0xff704a, 0xea3f28, 0xc61a1a,
        ]),
        text_rule: TextRule::DarkRanges(MIDDLE_DARK),
        aliases: &["PASTEL_THREE"],
    },
    PaletteDefinition {
        id: PaletteId::BlueToRed,
        label: "Blue → Red",
        description: "Diverging muted blue to rose.",
        colors: table([
            0x699ecd, 0x83add5, 0x9bbfe1, 0xb3d1eb, 0xcfe4f0, 0xfbcacc, 0xfa9699, 0xf97884, 0xf67a80, 0xf0545c,
        ]),
        text_rule: TextRule::Threshold { threshold: 11, inverted: true },
        aliases: &[],
    },
    PaletteDefinition {
        id: PaletteId::ViridisReverse,
        label: "Viridis",
        description: "Perceptually uniform, yellow for quiet and purple for crowded.",
        colors: table([
            0xfde725, 0xb5de2b, 0x6ece58, 0x35b779, 0x1f9e89, 0x26828e, 0x31688e, 0x3e4989, 0x482878, 0x440154,
        ]),
        text_rule: TextRule::Threshold { threshold: 6, inverted: false },
        aliases: &["VIRIDIS_REVERSED"],
    },
    PaletteDefinition {
        id: PaletteId::WhiteToBlue,
        label: "White → Blue → Black",
        description: "Near-white through royal blue to black.",
        colors: table([
            0xfefefe, 0xd0e0f0, 0xb0c4de, 0x7f8ebe, 0x4a69bd, 0x004dcc, 0x003a99, 0x002766, 0x001433, 0x000000,
        ]),
        text_rule: TextRule::Threshold { threshold: 6, inverted: false },
        aliases: &[],
    },
    PaletteDefinition {
        id: PaletteId::RdYlBuReversed,
        label: "RdYlBu (reversed)",
        description: "ColorBrewer diverging scheme, blue for quiet.",
        colors: table([
            0x053061, 0x2166ac, 0x4393c3, 0x92c5de, 0xd1e5f0, 0xfddbc7, 0xf4a582, 0xd6604d, 0xb2182b, 0x67001f,
        ]),
        text_rule: TextRule::DarkRanges(MIDDLE_DARK),
        aliases: &["RDYLBU_REVERSED"],
    },
    PaletteDefinition {
        id: PaletteId::Jet,
        label: "Jet",
        description: "Classic rainbow from navy to maroon.",
        colors: table([
            0x000080, 0x0000ff, 0x00bfff, 0x00ffff, 0x00ff00, 0x80ff00, 0xffff00, 0xff8000, 0xff0000, 0x800000,
        ]),
        text_rule: TextRule::DarkRanges(MIDDLE_DARK),
        aliases: &[],
    },
    PaletteDefinition {
        id: PaletteId::Turbo,
        label: "Turbo",
        description: "Improved rainbow with smoother lightness.",
        colors: table([
            0x30123b, 0x4067e9, 0x26a4f2, 0x4ac16d, 0xa7d65d, 0xfcce2e, 0xfb9e24, 0xf06b22, 0xd93806, 0x7a0403,
        ]),
        text_rule: TextRule::DarkRanges(MIDDLE_DARK),
        aliases: &[],
    },
    PaletteDefinition {
        id: PaletteId::Grads,
        label: "GrADS default",
        description: "Rainbow ramp used by the GrADS plotting package.",
        colors: table([
            0x000080, 0x0000ff, 0x0080ff, 0x00ffff, 0x00ff80, 0x00ff00, 0x80ff00, 0xffff00, 0xff8000, 0xff0000,
        ]),
        text_rule: TextRule::DarkRanges(MIDDLE_DARK),
        aliases: &[],
    },
    PaletteDefinition {
        id: PaletteId::CmThermal,
        label: "cmthermal",
        description: "Black body ramp from black through orange to near-white.",
        colors: table([
            0x000000, 0x240000, 0x580000, 0x8c0000, 0xc03b00, 0xf07800, 0xffb000, 0xffe060, 0xffff9f, 0xfefefe,
        ]),
        text_rule: TextRule::Threshold { threshold: 6, inverted: true },
        aliases: &[],
    },
    PaletteDefinition {
        id: PaletteId::GreenToRed,
        label: "Green → Red",
        description: "Material green through yellow to red.",
        colors: table([
            0xe8f5e9, 0xc8e6c9, 0xa5d6a7, 0xfff59d, 0xffe082, 0xffcc80, 0xffab91, 0xef9a9a, 0xe57373, 0xef5350,
        ]),
        text_rule: TextRule::Threshold { threshold: 6, inverted: false },
        aliases: &[],
    },
    PaletteDefinition {
        id: PaletteId::Viridis,
        label: "Viridis (forward)",
        description: "Viridis with purple for quiet and yellow for crowded.",
        colors: table([
            0x440154, 0x482878, 0x3e4989, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6ece58, 0xb5de2b, 0xfde725,
        ]),
        text_rule: TextRule::Threshold { threshold: 6, inverted: true },
        aliases: &[],
    },
];

const _: () = {
    let mut index = 0;
    while index < PaletteId::COUNT {
        assert!(PALETTE_DEFINITIONS[index].id as usize == index, "palette table out of order");
        assert!(PaletteId::ALL[index] as usize == index, "PaletteId::ALL out of order");
        index += 1;
    }
};

/// Iterate over all available definitions in catalog order.
pub fn all() -> &'static [PaletteDefinition] {
    PALETTE_DEFINITIONS
}

/// Locate a definition by a loosely typed name, such as a command-line
/// argument or environment variable.
///
/// Matching ignores case, surrounding whitespace, and treats `-` and spaces
/// as `_`, so `green-yellow-red` resolves to `GREEN_YELLOW_RED`. Aliases are
/// accepted too. Stored values and API input go through [`PaletteId::from_str`]
/// instead, which only accepts canonical ids.
pub fn resolve(name: &str) -> Option<&'static PaletteDefinition> {
    let normalized = normalize(name);
    if normalized.is_empty() {
        return None;
    }
    PALETTE_DEFINITIONS.iter().find(|definition| definition.matches(&normalized))
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|ch| match ch {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}
