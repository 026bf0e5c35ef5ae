//! Initial palette selection from overrides and persisted preferences.

use std::env;

use crowdmap_util::PreferenceStore;
use tracing::{debug, warn};

use crate::catalog::{self, PaletteId};

/// Preference key holding the active palette id.
pub const STORAGE_KEY: &str = "dashboard_color_palette";

/// Environment variable that forces a palette at startup.
pub const PALETTE_ENV: &str = "CROWDMAP_PALETTE";

/// Where the initial selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Override,
    Stored,
    Default,
}

/// Palette chosen at startup plus how it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialSelection {
    pub id: PaletteId,
    pub source: SelectionSource,
}

/// Reads [`PALETTE_ENV`], ignoring blank values.
pub fn env_override() -> Option<String> {
    env::var(PALETTE_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Selects the startup palette from an explicit override, the stored
/// preference, and finally [`PaletteId::DEFAULT`].
///
/// The override is user-typed and goes through [`catalog::resolve`]; the
/// stored value must be a canonical id.
///
/// Never fails: unreadable storage and unknown ids fall through to the next
/// source and are only logged.
pub fn resolve_initial(storage: &dyn PreferenceStore, override_id: Option<&str>) -> InitialSelection {
    if let Some(name) = override_id {
        match catalog::resolve(name) {
            Some(definition) => {
                debug!(palette = %definition.id, "Using palette override");
                return InitialSelection {
                    id: definition.id,
                    source: SelectionSource::Override,
                };
            }
            None => warn!(requested = %name, "Ignoring unknown palette override"),
        }
    }

    match storage.get(STORAGE_KEY) {
        Ok(Some(stored)) => match stored.parse::<PaletteId>() {
            Ok(id) => {
                debug!(palette = %id, "Loaded stored palette");
                return InitialSelection {
                    id,
                    source: SelectionSource::Stored,
                };
            }
            Err(_) => warn!(stored = %stored, "Stored palette is not in the catalog; using default"),
        },
        Ok(None) => debug!("No stored palette; using default"),
        Err(error) => warn!(error = %error, "Failed to read stored palette; using default"),
    }

    InitialSelection {
        id: PaletteId::DEFAULT,
        source: SelectionSource::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdmap_util::{InMemoryPreferenceStore, PreferencesError};

    #[derive(Debug)]
    struct UnreadableStore;

    impl PreferenceStore for UnreadableStore {
        fn get(&self, _key: &str) -> Result<Option<String>, PreferencesError> {
            Err(PreferencesError::Io(std::io::Error::other("disk unplugged")))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), PreferencesError> {
            Err(PreferencesError::Io(std::io::Error::other("disk unplugged")))
        }
    }

    #[test]
    fn empty_storage_yields_default() {
        let selection = resolve_initial(&InMemoryPreferenceStore::new(), None);
        assert_eq!(selection.id, PaletteId::DEFAULT);
        assert_eq!(selection.source, SelectionSource::Default);
    }

    #[test]
    fn stored_palette_is_used() {
        let storage = InMemoryPreferenceStore::with_entry(STORAGE_KEY, "TURBO");
        let selection = resolve_initial(&storage, None);
        assert_eq!(selection.id, PaletteId::Turbo);
        assert_eq!(selection.source, SelectionSource::Stored);
    }

    #[test]
    fn unknown_stored_palette_falls_back_to_default() {
        let storage = InMemoryPreferenceStore::with_entry(STORAGE_KEY, "NOT_A_PALETTE");
        assert_eq!(resolve_initial(&storage, None).id, PaletteId::DEFAULT);
    }

    #[test]
    fn stored_value_must_be_canonical() {
        for stored in ["jet", "green-yellow-red", "PASTEL_ONE", " TURBO "] {
            let storage = InMemoryPreferenceStore::with_entry(STORAGE_KEY, stored);
            let selection = resolve_initial(&storage, None);
            assert_eq!(selection.id, PaletteId::DEFAULT, "stored {stored:?}");
            assert_eq!(selection.source, SelectionSource::Default);
        }
    }

    #[test]
    fn read_failure_falls_back_to_default() {
        let selection = resolve_initial(&UnreadableStore, None);
        assert_eq!(selection.id, PaletteId::DEFAULT);
        assert_eq!(selection.source, SelectionSource::Default);
    }

    #[test]
    fn override_beats_storage() {
        let storage = InMemoryPreferenceStore::with_entry(STORAGE_KEY, "TURBO");
        let selection = resolve_initial(&storage, Some("jet"));
        assert_eq!(selection.id, PaletteId::Jet);
        assert_eq!(selection.source, SelectionSource::Override);
    }

    #[test]
    fn invalid_override_is_ignored() {
        let storage = InMemoryPreferenceStore::with_entry(STORAGE_KEY, "TURBO");
        assert_eq!(resolve_initial(&storage, Some("sepia")).id, PaletteId::Turbo);
    }

    #[test]
    fn env_override_reads_and_trims() {
        temp_env::with_var(PALETTE_ENV, Some("  viridis "), || {
            assert_eq!(env_override().as_deref(), Some("viridis"));
        });
        temp_env::with_var(PALETTE_ENV, Some("   "), || {
            assert_eq!(env_override(), None);
        });
        temp_env::with_var_unset(PALETTE_ENV, || {
            assert_eq!(env_override(), None);
        });
    }
}
