//! The active-palette store consumed by dashboard renderers.
//!
//! A [`PaletteStore`] owns the current selection for one application
//! instance. It is created once and handed to every component that colors
//! congestion cells. The selection is loaded lazily on first access and
//! changes only through [`PaletteStore::set_active_palette`] or
//! [`PaletteStore::set_active`].
//!
//! Reads take a shared lock and copy the [`PaletteId`] out; writes replace the
//! whole id, so a reader never observes a partially applied change. Changes
//! are serialized: the swap, the notifications and the persisted write of one
//! change all complete before the next change starts.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crowdmap_types::{CongestionLevel, LevelInput, Rgb};
use crowdmap_util::{InMemoryPreferenceStore, PreferenceStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{self, PaletteDefinition, PaletteId};
use crate::error::PaletteError;
use crate::loader::{self, STORAGE_KEY};

/// Lifecycle of the active selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// Nothing has asked for the palette yet.
    Uninitialized,
    /// The stored preference is being read.
    Loading,
    /// A palette is active.
    Ready(PaletteId),
}

/// Entry returned by [`PaletteStore::list_palettes`] for selection UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteSummary {
    pub id: PaletteId,
    pub display_name: &'static str,
    pub description: &'static str,
    pub sample_colors: [Rgb; CongestionLevel::COUNT],
}

impl From<&PaletteDefinition> for PaletteSummary {
    fn from(definition: &PaletteDefinition) -> Self {
        Self {
            id: definition.id,
            display_name: definition.label,
            description: definition.description,
            sample_colors: definition.sample_colors(),
        }
    }
}

/// Background and foreground for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellStyle {
    pub background: Rgb,
    pub foreground: Rgb,
}

/// Handle returned by [`PaletteStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(PaletteId) + Send + Sync>;

/// Single source of truth for the active palette.
pub struct PaletteStore {
    storage: Arc<dyn PreferenceStore>,
    startup_override: Option<String>,
    selection: RwLock<SelectionState>,
    /// Held for the whole of a change or reload.
    writer: Mutex<()>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl fmt::Debug for PaletteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaletteStore")
            .field("storage", &self.storage)
            .field("startup_override", &self.startup_override)
            .field("selection", &self.state())
            .field("listeners", &self.lock_listeners().len())
            .finish()
    }
}

impl PaletteStore {
    /// Create a store that reads and writes its selection through `storage`.
    pub fn new(storage: Arc<dyn PreferenceStore>) -> Self {
        Self {
            storage,
            startup_override: None,
            selection: RwLock::new(SelectionState::Uninitialized),
            writer: Mutex::new(()),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// Create a store that also honors the `CROWDMAP_PALETTE` override.
    pub fn from_environment(storage: Arc<dyn PreferenceStore>) -> Self {
        Self::new(storage).with_startup_override(loader::env_override())
    }

    /// Store whose selection lives only as long as the process.
    pub fn ephemeral() -> Self {
        Self::new(Arc::new(InMemoryPreferenceStore::new()))
    }

    /// Palette id that takes precedence over the stored preference at load time.
    pub fn with_startup_override(mut self, id: Option<String>) -> Self {
        self.startup_override = id;
        self
    }

    /// Every palette in catalog order, with swatch colors for levels 1..=10.
    pub fn list_palettes(&self) -> Vec<PaletteSummary> {
        catalog::all().iter().map(PaletteSummary::from).collect()
    }

    pub fn state(&self) -> SelectionState {
        *self.read_selection()
    }

    /// The active palette id, loading it from storage on first access.
    pub fn active_palette_id(&self) -> PaletteId {
        self.ensure_loaded()
    }

    pub fn active_palette(&self) -> &'static PaletteDefinition {
        self.ensure_loaded().definition()
    }

    /// Activate the palette named `id`.
    ///
    /// Unknown ids fail with [`PaletteError::InvalidPaletteId`] and leave the
    /// selection untouched. On success, subscribers are notified before this
    /// returns and the id is persisted best-effort.
    pub fn set_active_palette(&self, id: &str) -> Result<PaletteId, PaletteError> {
        let palette_id = id.parse::<PaletteId>().inspect_err(|_| {
            warn!(requested = %id, "Rejected unknown palette id");
        })?;
        self.set_active(palette_id);
        Ok(palette_id)
    }

    /// Activate a palette by typed id. Never fails.
    ///
    /// Listeners must not change the palette from inside their callback;
    /// doing so deadlocks on the writer lock.
    pub fn set_active(&self, id: PaletteId) {
        let _writer = self.lock_writer();
        let previous = {
            let mut selection = self.write_selection();
            std::mem::replace(&mut *selection, SelectionState::Ready(id))
        };
        match previous {
            SelectionState::Ready(old) => info!(from = %old, to = %id, "Palette changed"),
            _ => info!(to = %id, "Palette selected"),
        }

        self.notify(id);
        self.persist(id);
    }

    /// Forget the in-memory selection and load it again from storage, picking
    /// up changes another process wrote since the first load.
    pub fn reload(&self) -> PaletteId {
        let _writer = self.lock_writer();
        *self.write_selection() = SelectionState::Uninitialized;
        self.ensure_loaded()
    }

    /// Background color for `level` under the active palette.
    ///
    /// Missing, non-integral or out-of-range levels yield
    /// [`catalog::SENTINEL_COLOR`].
    pub fn color_for(&self, level: impl LevelInput) -> Rgb {
        self.active_palette().color(level)
    }

    /// Foreground color paired with [`PaletteStore::color_for`].
    pub fn text_color_for(&self, level: impl LevelInput) -> Rgb {
        self.active_palette().text_color(level)
    }

    /// Both colors for one cell, resolved against a single palette snapshot.
    pub fn cell_style(&self, level: impl LevelInput) -> CellStyle {
        let palette = self.active_palette();
        let level = level.to_congestion_level();
        CellStyle {
            background: palette.color(level),
            foreground: palette.text_color(level),
        }
    }

    /// Register a callback invoked with the new id after every palette change.
    ///
    /// Callbacks run synchronously on the thread that changed the palette,
    /// in subscription order.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(PaletteId) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, Arc::new(listener)));
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != before
    }

    fn ensure_loaded(&self) -> PaletteId {
        if let SelectionState::Ready(id) = *self.read_selection() {
            return id;
        }

        let mut selection = self.write_selection();
        if let SelectionState::Ready(id) = *selection {
            return id;
        }
        *selection = SelectionState::Loading;
        let initial = loader::resolve_initial(self.storage.as_ref(), self.startup_override.as_deref());
        debug!(palette = %initial.id, source = ?initial.source, "Palette selection ready");
        *selection = SelectionState::Ready(initial.id);
        initial.id
    }

    fn notify(&self, id: PaletteId) {
        // Clone out so a listener may call back into the store.
        let listeners: Vec<Listener> = self.lock_listeners().iter().map(|(_, listener)| Arc::clone(listener)).collect();
        for listener in listeners {
            listener(id);
        }
    }

    fn persist(&self, id: PaletteId) {
        if let Err(error) = self.storage.set(STORAGE_KEY, id.as_str()) {
            warn!(palette = %id, error = %error, "Failed to persist palette; keeping in-memory selection");
        }
    }

    fn read_selection(&self) -> RwLockReadGuard<'_, SelectionState> {
        self.selection.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_selection(&self) -> RwLockWriteGuard<'_, SelectionState> {
        self.selection.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SENTINEL_COLOR;
    use crate::foreground::{DARK_TEXT, LIGHT_TEXT};
    use crowdmap_util::PreferencesError;
    use serde_json::json;
    use std::sync::atomic::AtomicBool;

    #[derive(Debug, Default)]
    struct BrokenStore {
        writes_attempted: AtomicU64,
    }

    impl PreferenceStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, PreferencesError> {
            Err(PreferencesError::Io(std::io::Error::other("read-only medium")))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), PreferencesError> {
            self.writes_attempted.fetch_add(1, Ordering::SeqCst);
            Err(PreferencesError::Io(std::io::Error::other("read-only medium")))
        }
    }

    fn store_with(stored: Option<&str>) -> (PaletteStore, Arc<InMemoryPreferenceStore>) {
        let storage = Arc::new(match stored {
            Some(value) => InMemoryPreferenceStore::with_entry(STORAGE_KEY, value),
            None => InMemoryPreferenceStore::new(),
        });
        (PaletteStore::new(storage.clone()), storage)
    }

    #[test]
    fn loads_lazily_on_first_access() {
        let (store, _) = store_with(Some("JET"));
        assert_eq!(store.state(), SelectionState::Uninitialized);
        assert_eq!(store.active_palette_id(), PaletteId::Jet);
        assert_eq!(store.state(), SelectionState::Ready(PaletteId::Jet));
    }

    #[test]
    fn default_palette_colors() {
        let store = PaletteStore::ephemeral();
        assert_eq!(store.active_palette_id(), PaletteId::GreenYellowRed);
        assert_eq!(store.color_for(1), Rgb::from_hex(0xf9f1dc));
        assert_eq!(store.color_for(10), Rgb::from_hex(0xc61a1a));
        assert_eq!(store.color_for(0), SENTINEL_COLOR);
        assert_eq!(store.color_for(None::<u8>), SENTINEL_COLOR);
    }

    #[test]
    fn invalid_levels_return_sentinel_for_every_palette() {
        let store = PaletteStore::ephemeral();
        for id in PaletteId::ALL {
            store.set_active(id);
            for level in [json!(0), json!(-2), json!(11), json!(3.5), json!(null), json!("4")] {
                assert_eq!(store.color_for(&level), SENTINEL_COLOR, "{id} {level}");
                assert_eq!(store.text_color_for(&level), SENTINEL_COLOR, "{id} {level}");
            }
        }
    }

    #[test]
    fn valid_levels_are_deterministic() {
        let store = PaletteStore::ephemeral();
        for id in PaletteId::ALL {
            store.set_active(id);
            for level in 1..=10 {
                let first = store.color_for(level);
                assert_ne!(first, SENTINEL_COLOR);
                assert_eq!(store.color_for(level), first);
                assert_eq!(store.text_color_for(level), store.text_color_for(level));
            }
        }
    }

    #[test]
    fn set_then_get_round_trips_for_every_palette() {
        let store = PaletteStore::ephemeral();
        for id in PaletteId::ALL {
            assert_eq!(store.set_active_palette(id.as_str()).unwrap(), id);
            assert_eq!(store.active_palette_id(), id);
        }
    }

    #[test]
    fn unknown_id_is_rejected_without_side_effects() {
        let (store, storage) = store_with(Some("TURBO"));
        let notified = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&notified);
        store.subscribe(move |_| flag.store(true, Ordering::SeqCst));

        let before = store.active_palette_id();
        let error = store.set_active_palette("NOT_A_PALETTE").unwrap_err();
        assert_eq!(error, PaletteError::InvalidPaletteId("NOT_A_PALETTE".to_string()));
        assert_eq!(store.active_palette_id(), before);
        assert!(!notified.load(Ordering::SeqCst));
        assert_eq!(storage.get(STORAGE_KEY).unwrap().as_deref(), Some("TURBO"));
    }

    #[test]
    fn successful_set_persists_canonical_id() {
        let (store, storage) = store_with(None);
        store.set_active_palette("RDYLBU_R").unwrap();
        assert_eq!(storage.get(STORAGE_KEY).unwrap().as_deref(), Some("RDYLBU_R"));
    }

    #[test]
    fn non_canonical_ids_are_rejected() {
        let (store, storage) = store_with(None);
        let listed: Vec<&str> = store.list_palettes().iter().map(|summary| summary.id.as_str()).collect();
        for id in ["jet", "green-yellow-red", "PASTEL_ONE", " Turbo "] {
            assert!(!listed.contains(&id));
            assert_eq!(store.set_active_palette(id), Err(PaletteError::InvalidPaletteId(id.to_string())));
        }
        assert_eq!(store.active_palette_id(), PaletteId::DEFAULT);
        assert_eq!(storage.get(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn non_canonical_stored_id_loads_default() {
        let (store, _) = store_with(Some("jet"));
        assert_eq!(store.active_palette_id(), PaletteId::DEFAULT);
    }

    #[test]
    fn concurrent_changes_leave_memory_storage_and_listeners_agreeing() {
        let (store, storage) = store_with(None);
        let store = Arc::new(store);
        let notified = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notified);
        store.subscribe(move |id| sink.lock().unwrap().push(id));

        let handles: Vec<_> = PaletteId::ALL
            .into_iter()
            .map(|id| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        store.set_active(id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let active = store.active_palette_id();
        let notified = notified.lock().unwrap();
        assert_eq!(notified.len(), PaletteId::COUNT * 20);
        assert_eq!(notified.last(), Some(&active));
        assert_eq!(storage.get(STORAGE_KEY).unwrap().as_deref(), Some(active.as_str()));
    }

    #[test]
    fn reload_reads_persisted_selection() {
        let (store, storage) = store_with(None);
        store.set_active(PaletteId::CmThermal);

        let restarted = PaletteStore::new(storage);
        assert_eq!(restarted.active_palette_id(), PaletteId::CmThermal);
        assert_eq!(store.reload(), PaletteId::CmThermal);
    }

    #[test]
    fn unknown_stored_id_falls_back_silently() {
        let (store, _) = store_with(Some("NOT_A_PALETTE"));
        assert_eq!(store.active_palette_id(), PaletteId::DEFAULT);
    }

    #[test]
    fn storage_failures_never_surface() {
        let storage = Arc::new(BrokenStore::default());
        let store = PaletteStore::new(storage.clone());
        assert_eq!(store.active_palette_id(), PaletteId::DEFAULT);

        assert_eq!(store.set_active_palette("JET"), Ok(PaletteId::Jet));
        assert_eq!(store.active_palette_id(), PaletteId::Jet);
        assert_eq!(store.color_for(1), Rgb::from_hex(0x000080));
        assert_eq!(storage.writes_attempted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribers_see_the_new_palette_before_set_returns() {
        let store = Arc::new(PaletteStore::ephemeral());
        let observed = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&observed);
        let reader = Arc::downgrade(&store);
        store.subscribe(move |id| {
            let color = reader.upgrade().map(|store| store.color_for(10));
            sink.lock().unwrap().push((id, color));
        });

        store.set_active(PaletteId::Viridis);
        store.set_active(PaletteId::Jet);

        let observed = observed.lock().unwrap();
        assert_eq!(
            *observed,
            vec![
                (PaletteId::Viridis, Some(Rgb::from_hex(0xfde725))),
                (PaletteId::Jet, Some(Rgb::from_hex(0x800000))),
            ]
        );
    }

    #[test]
    fn unsubscribed_listeners_are_not_called() {
        let store = PaletteStore::ephemeral();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let subscription = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.set_active(PaletteId::Turbo);
        assert!(store.unsubscribe(subscription));
        assert!(!store.unsubscribe(subscription));
        store.set_active(PaletteId::Grads);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn list_palettes_is_stable_and_complete() {
        let store = PaletteStore::ephemeral();
        let first = store.list_palettes();
        assert_eq!(first.len(), PaletteId::COUNT);
        assert_eq!(first, store.list_palettes());
        let ids: Vec<PaletteId> = first.iter().map(|summary| summary.id).collect();
        assert_eq!(ids, PaletteId::ALL.to_vec());
        assert_eq!(first[1].sample_colors[0], Rgb::from_hex(0xf9f1dc));
        assert_eq!(first[1].description, PaletteId::GreenYellowRed.definition().description);
        assert!(first.iter().all(|summary| !summary.description.is_empty()));
    }

    #[test]
    fn text_colors_follow_the_palette_rule() {
        let store = PaletteStore::ephemeral();
        assert_eq!(store.text_color_for(6), DARK_TEXT);
        assert_eq!(store.text_color_for(7), LIGHT_TEXT);

        store.set_active(PaletteId::PasteleOne);
        assert_eq!(store.text_color_for(2), LIGHT_TEXT);
        assert_eq!(store.text_color_for(3), DARK_TEXT);
        assert_eq!(store.text_color_for(8), DARK_TEXT);
        assert_eq!(store.text_color_for(9), LIGHT_TEXT);
    }

    #[test]
    fn cell_style_pairs_both_lookups() {
        let store = PaletteStore::ephemeral();
        store.set_active(PaletteId::CmThermal);
        let style = store.cell_style(json!(1));
        assert_eq!(style.background, Rgb::BLACK);
        assert_eq!(style.foreground, LIGHT_TEXT);
        let empty = store.cell_style(json!(null));
        assert_eq!(empty.background, SENTINEL_COLOR);
        assert_eq!(empty.foreground, SENTINEL_COLOR);
    }

    #[test]
    fn startup_override_wins_over_storage() {
        let storage = Arc::new(InMemoryPreferenceStore::with_entry(STORAGE_KEY, "TURBO"));
        let store = PaletteStore::new(storage).with_startup_override(Some("viridis".into()));
        assert_eq!(store.active_palette_id(), PaletteId::Viridis);
    }

    #[test]
    fn set_before_first_access_skips_loading() {
        let (store, _) = store_with(Some("TURBO"));
        store.set_active(PaletteId::Jet);
        assert_eq!(store.active_palette_id(), PaletteId::Jet);
    }
}
