//! Congestion levels reported by the analytics API.
//!
//! Upstream payloads encode a level as a JSON number in `1..=10`; `0`, `null`
//! or a missing field mean "no data". Every raw shape a renderer might hold is
//! funneled through [`LevelInput`], which yields `None` for anything that is
//! not a valid level instead of failing.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error returned when a raw integer is outside `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("congestion level {0} is outside 1..=10")]
pub struct LevelOutOfRange(pub i64);

/// A validated congestion level in `1..=10`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CongestionLevel(u8);

impl CongestionLevel {
    pub const MIN: CongestionLevel = CongestionLevel(1);
    pub const MAX: CongestionLevel = CongestionLevel(10);
    /// Number of distinct levels.
    pub const COUNT: usize = 10;

    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN.0 && value <= Self::MAX.0 { Some(Self(value)) } else { None }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position of this level inside a ten-entry table.
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Every level from lowest to highest.
    pub fn all() -> impl Iterator<Item = CongestionLevel> {
        (Self::MIN.0..=Self::MAX.0).map(CongestionLevel)
    }
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for CongestionLevel {
    type Error = LevelOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(LevelOutOfRange(i64::from(value)))
    }
}

impl From<CongestionLevel> for u8 {
    fn from(level: CongestionLevel) -> Self {
        level.0
    }
}

/// Conversion from whatever raw value a caller holds into a level.
///
/// Returns `None` for missing, non-numeric, fractional or out-of-range input.
pub trait LevelInput {
    fn to_congestion_level(&self) -> Option<CongestionLevel>;
}

impl LevelInput for CongestionLevel {
    fn to_congestion_level(&self) -> Option<CongestionLevel> {
        Some(*self)
    }
}

macro_rules! integer_level_input {
    ($($ty:ty),*) => {
        $(
            impl LevelInput for $ty {
                fn to_congestion_level(&self) -> Option<CongestionLevel> {
                    u8::try_from(*self).ok().and_then(CongestionLevel::new)
                }
            }
        )*
    };
}

integer_level_input!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl LevelInput for f64 {
    fn to_congestion_level(&self) -> Option<CongestionLevel> {
        if !self.is_finite() || self.fract() != 0.0 {
            return None;
        }
        if *self < f64::from(CongestionLevel::MIN.0) || *self > f64::from(CongestionLevel::MAX.0) {
            return None;
        }
        CongestionLevel::new(*self as u8)
    }
}

impl LevelInput for f32 {
    fn to_congestion_level(&self) -> Option<CongestionLevel> {
        f64::from(*self).to_congestion_level()
    }
}

/// Text input, as typed on a command line. JSON strings are deliberately not
/// accepted through [`Value`]; see its implementation.
impl LevelInput for str {
    fn to_congestion_level(&self) -> Option<CongestionLevel> {
        self.trim().parse::<f64>().ok().and_then(|value| value.to_congestion_level())
    }
}

impl LevelInput for String {
    fn to_congestion_level(&self) -> Option<CongestionLevel> {
        self.as_str().to_congestion_level()
    }
}

/// Only JSON numbers are levels; `"5"`, booleans and `null` are "no data".
impl LevelInput for Value {
    fn to_congestion_level(&self) -> Option<CongestionLevel> {
        match self {
            Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    value.to_congestion_level()
                } else if let Some(value) = number.as_u64() {
                    value.to_congestion_level()
                } else {
                    number.as_f64().and_then(|value| value.to_congestion_level())
                }
            }
            _ => None,
        }
    }
}

impl<T: LevelInput> LevelInput for Option<T> {
    fn to_congestion_level(&self) -> Option<CongestionLevel> {
        self.as_ref().and_then(LevelInput::to_congestion_level)
    }
}

impl<T: LevelInput + ?Sized> LevelInput for &T {
    fn to_congestion_level(&self) -> Option<CongestionLevel> {
        (**self).to_congestion_level()
    }
}
