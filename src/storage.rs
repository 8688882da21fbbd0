//! Whole-object settings persistence: one JSON file under the user's
//! config directory, loaded with defaults on any failure, plus a watcher
//! that reports externally-made changes.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use thistermination::TerminationFull;

use crate::bands::EqSettings;

pub const SETTINGS_FILE: &str = "eq_settings.json";

#[derive(TerminationFull)]
pub enum StorageError {
    #[termination(msg("{0:?}"))]
    Io(#[from] std::io::Error),
    #[termination(msg("{0:?}"))]
    Serde(#[from] serde_json::Error),
}

/// Persistence collaborator contract: a single settings object under a
/// fixed key, always read and written wholesale.
pub trait SettingsStore {
    fn load(&self) -> EqSettings;
    fn save(&mut self, settings: &EqSettings) -> Result<(), StorageError>;
}

/// File-backed store keeping `eq_settings.json` in a base directory.
pub struct JsonSettingsStore {
    dir: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonSettingsStore { dir: dir.into() }
    }

    /// The store at the conventional per-user location.
    pub fn default_location() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parameq");
        JsonSettingsStore::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> EqSettings {
        let path = self.settings_path();
        if !path.exists() {
            return EqSettings::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(settings) => settings,
                Err(err) => {
                    crate::debug_println!("Ignoring unreadable {}: {:?}", SETTINGS_FILE, err);
                    EqSettings::default()
                }
            },
            Err(_) => EqSettings::default(),
        }
    }

    fn save(&mut self, settings: &EqSettings) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_string_pretty(settings)?;
        std::fs::write(self.settings_path(), data)?;
        Ok(())
    }
}

/// Creates a file watcher on the store's directory.
/// Returns the watcher (must be kept alive) and a receiver that fires
/// whenever the settings file changes from outside this process.
pub fn watch_settings_dir(
    store: &JsonSettingsStore,
) -> notify::Result<(notify::RecommendedWatcher, mpsc::Receiver<()>)> {
    use notify::{Event, EventKind, RecursiveMode, Watcher};

    let (tx, rx) = mpsc::channel();
    let dir = store.dir().to_path_buf();

    // Ensure the directory exists so we can watch it
    std::fs::create_dir_all(&dir).ok();

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            match event.kind {
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                    let _ = tx.send(());
                }
                _ => {}
            }
        }
    })?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    Ok((watcher, rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::default_bands;
    use crate::presets::{Preset, PresetBand};

    fn temp_store(tag: &str) -> JsonSettingsStore {
        let dir = std::env::temp_dir()
            .join("parameq-tests")
            .join(format!("{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        JsonSettingsStore::new(dir)
    }

    #[test]
    fn missing_file_loads_defaults() {
        let store = temp_store("missing");
        let settings = store.load();
        assert_eq!(settings, EqSettings::default());
        assert!(settings.is_active);
        assert_eq!(settings.bands.len(), 6);
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let mut store = temp_store("corrupt");
        store.save(&EqSettings::default()).unwrap();
        std::fs::write(store.dir().join(SETTINGS_FILE), "not json {").unwrap();
        assert_eq!(store.load(), EqSettings::default());
    }

    #[test]
    fn settings_round_trip_wholesale() {
        let mut store = temp_store("round-trip");

        let mut settings = EqSettings::default();
        settings.is_active = false;
        settings.theme_is_dark = true;
        settings.bands[0].gain = 7.5;
        settings.bands[3].is_active = false;
        settings.remember_channel("some_channel", Some("Some Channel".to_string()));
        settings.presets.insert(
            "warm".to_string(),
            Preset {
                name: "Warm".to_string(),
                bands: default_bands().iter().map(PresetBand::from).collect(),
                is_user_preset: true,
            },
        );

        store.save(&settings).unwrap();
        let loaded = store.load();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn preset_bands_default_to_active_when_omitted() {
        // Settings written by hand (or an older build) may omit the
        // per-band active flag inside presets.
        let mut store = temp_store("omitted-active");
        let json = r##"{
            "is_active": true,
            "theme_is_dark": false,
            "bands": [
                {"id": 1, "frequency": 60.0, "gain": 0.0, "q": 0.8, "is_active": true, "color": "#EC407A"}
            ],
            "presets": {
                "warm": {
                    "name": "Warm",
                    "bands": [{"frequency": 60.0, "gain": 2.0, "q": 0.8}]
                }
            }
        }"##;
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join(SETTINGS_FILE), json).unwrap();

        let loaded = store.load();
        let warm = &loaded.presets["warm"];
        assert!(warm.bands[0].is_active);
        assert!(!warm.is_user_preset, "flag defaults false and is re-marked on catalog load");
        let _ = store.save(&loaded);
    }
}
