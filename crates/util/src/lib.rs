//! Persistence and path utilities for the crowdmap crates.

pub mod paths;
pub mod preferences;

pub use paths::{expand_tilde, expand_tilde_path};
pub use preferences::{InMemoryPreferenceStore, JsonPreferenceStore, PreferenceStore, PreferencesError};
