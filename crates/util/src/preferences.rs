//! User preference persistence for the crowdmap dashboard.
//!
//! Preferences are a flat string-to-string map. The JSON-backed store writes
//! them to the standard configuration directory
//! (`~/.config/crowdmap/preferences.json` on most platforms); the in-memory
//! store backs tests and sessions where the config directory is unusable.
//! Both are safe to share between threads thanks to the internal `Mutex`.
//!
//! The JSON store re-reads its file on every access, so values written by
//! another process are visible without reopening the store.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::paths::{config_file_path, expand_tilde_path};

/// Environment variable allowing callers to override the preferences file path.
pub const PREFERENCES_PATH_ENV: &str = "CROWDMAP_PREFERENCES_PATH";

/// Default filename for the JSON payload.
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Error surfaced when reading or writing preferences fails.
#[derive(Debug, Error)]
pub enum PreferencesError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("preferences I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("preferences serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value persistence surface for cosmetic user preferences.
pub trait PreferenceStore: Send + Sync + Debug {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, PreferencesError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), PreferencesError>;
}

/// Persisted preference values, in insertion order.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
struct PreferencesPayload {
    entries: IndexMap<String, String>,
}

/// Preferences store backed by a JSON file.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    payload: Mutex<PreferencesPayload>,
}

impl JsonPreferenceStore {
    /// Create a store rooted at the provided path. When `path` is `None`, the
    /// default config directory path is used.
    pub fn new<P: Into<Option<PathBuf>>>(path: P) -> Result<Self, PreferencesError> {
        let resolved_path = match path.into() {
            Some(path) => expand_tilde_path(path),
            None => default_preferences_path(),
        };
        let payload = load_payload(&resolved_path)?;
        Ok(Self {
            path: resolved_path,
            payload: Mutex::new(payload),
        })
    }

    /// Lock the cached payload after refreshing it from disk.
    fn lock_fresh(&self) -> Result<MutexGuard<'_, PreferencesPayload>, PreferencesError> {
        let mut payload = self.payload.lock().unwrap_or_else(PoisonError::into_inner);
        *payload = load_payload(&self.path)?;
        Ok(payload)
    }

    fn save_locked(&self, payload: &PreferencesPayload) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(payload)?;
        fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), "Saved preferences");
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferencesError> {
        Ok(self.lock_fresh()?.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferencesError> {
        let mut payload = self.lock_fresh()?;
        payload.entries.insert(key.to_string(), value.to_string());
        self.save_locked(&payload)
    }
}

/// In-memory preferences store used by tests and as a fallback when the
/// config directory cannot be accessed.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    payload: Mutex<PreferencesPayload>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a single entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.lock().entries.insert(key.into(), value.into());
        store
    }

    fn lock(&self) -> MutexGuard<'_, PreferencesPayload> {
        self.payload.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferencesError> {
        Ok(self.lock().entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferencesError> {
        self.lock().entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Resolve the preferences file location, honoring [`PREFERENCES_PATH_ENV`].
pub fn default_preferences_path() -> PathBuf {
    config_file_path(PREFERENCES_PATH_ENV, PREFERENCES_FILE_NAME)
}

fn load_payload(path: &Path) -> Result<PreferencesPayload, PreferencesError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(payload) => Ok(payload),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse preferences file; using defaults"
                );
                Ok(PreferencesPayload::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(PreferencesPayload::default()),
        Err(error) => Err(PreferencesError::Io(error)),
    }
}
