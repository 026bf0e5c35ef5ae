//! Congestion-level color palettes for the crowdmap dashboard.
//!
//! [`PaletteStore`] is the single source of truth for which palette is
//! active. Renderers ask it for the background ([`PaletteStore::color_for`])
//! and foreground ([`PaletteStore::text_color_for`]) of each cell, and the
//! selection UI lists palettes and switches between them. The selection is
//! persisted through any [`crowdmap_util::PreferenceStore`].

pub mod catalog;
pub mod error;
pub mod foreground;
pub mod loader;
pub mod store;

pub use catalog::{PALETTE_DEFINITIONS, PaletteDefinition, PaletteId, SENTINEL_COLOR};
pub use error::PaletteError;
pub use foreground::{DARK_TEXT, LIGHT_TEXT, TextRule};
pub use loader::{InitialSelection, PALETTE_ENV, STORAGE_KEY, SelectionSource};
pub use store::{CellStyle, PaletteStore, PaletteSummary, SelectionState, SubscriptionId};

pub use crowdmap_types::{CongestionLevel, LevelInput, Rgb};
