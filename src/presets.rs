//! Built-in and user-defined band configurations, with lookup, save,
//! delete, and the matching algorithm that classifies an arbitrary band
//! configuration as a known preset or "custom".

use std::collections::HashMap;

#[cfg(feature = "persistence")]
use serde::{Deserialize, Serialize};

use crate::bands::{Band, DEFAULT_BANDS, NUM_BANDS};

/// Selector id of the synthetic "no preset matches" entry.
pub const CUSTOM_PRESET_ID: &str = "custom";

/// Matching tolerances: values within these deltas still count as equal.
const FREQUENCY_TOLERANCE: f64 = 1.0;
const GAIN_TOLERANCE: f64 = 0.1;
const Q_TOLERANCE: f64 = 0.1;

/// One band of a preset. Compared positionally against a live band array,
/// never by band id.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persistence", derive(Serialize, Deserialize))]
pub struct PresetBand {
    pub frequency: f64,
    pub gain: f64,
    pub q: f64,
    #[cfg_attr(feature = "persistence", serde(default = "active_by_default"))]
    pub is_active: bool,
}

#[cfg(feature = "persistence")]
fn active_by_default() -> bool {
    true
}

impl From<&Band> for PresetBand {
    fn from(band: &Band) -> Self {
        PresetBand {
            frequency: band.frequency,
            gain: band.gain,
            q: band.q,
            is_active: band.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persistence", derive(Serialize, Deserialize))]
pub struct Preset {
    pub name: String,
    pub bands: Vec<PresetBand>,
    #[cfg_attr(feature = "persistence", serde(default))]
    pub is_user_preset: bool,
}

fn preset(name: &str, gains: [f64; NUM_BANDS]) -> Preset {
    Preset {
        name: name.to_string(),
        bands: DEFAULT_BANDS
            .iter()
            .zip(gains)
            .map(|(&(frequency, q, _), gain)| PresetBand {
                frequency,
                gain,
                q,
                is_active: true,
            })
            .collect(),
        is_user_preset: false,
    }
}

/// The immutable built-in presets, in their fixed catalog order.
pub fn builtin_presets() -> Vec<(String, Preset)> {
    vec![
        ("flat".to_string(), preset("Flat", [0.0; NUM_BANDS])),
        (
            "bass-boost".to_string(),
            preset("Bass Boost", [8.0, 4.0, 0.0, 0.0, 0.0, 0.0]),
        ),
        (
            "treble-boost".to_string(),
            preset("Treble Boost", [0.0, 0.0, 0.0, 4.0, 6.0, 8.0]),
        ),
        (
            "v-shaped".to_string(),
            preset("V-Shaped", [6.0, 2.0, -2.0, 1.0, 4.0, 6.0]),
        ),
    ]
}

/// Derive a preset id from its display name: lowercase, every character
/// outside `[a-z0-9]` replaced by `-`. Distinct names can collide (for
/// example `"My EQ"` and `"my eq"`); a colliding save simply overwrites.
pub fn preset_id(name: &str) -> String {
    name.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn matches_preset(bands: &[Band], preset: &Preset) -> bool {
    if bands.len() != preset.bands.len() {
        return false;
    }
    bands.iter().zip(&preset.bands).all(|(band, preset_band)| {
        (band.frequency - preset_band.frequency).abs() <= FREQUENCY_TOLERANCE
            && (band.gain - preset_band.gain).abs() <= GAIN_TOLERANCE
            && (band.q - preset_band.q).abs() <= Q_TOLERANCE
            && band.is_active == preset_band.is_active
    })
}

/// One row of the preset selector: the synthetic custom entry first,
/// then built-ins, then user presets (marked for display).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorEntry {
    pub id: String,
    pub label: String,
    pub is_user_preset: bool,
}

/// Built-in presets merged with the user's own. Built-ins always resolve
/// first: a user id colliding with a built-in never shadows it.
pub struct PresetCatalog {
    builtins: Vec<(String, Preset)>,
    user: Vec<(String, Preset)>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        PresetCatalog::new()
    }
}

impl PresetCatalog {
    pub fn new() -> Self {
        PresetCatalog {
            builtins: builtin_presets(),
            user: Vec::new(),
        }
    }

    /// Build a catalog from persisted user presets. Entries shadowing a
    /// built-in id are discarded; the rest are ordered by id so catalog
    /// iteration stays stable across runs.
    pub fn with_user_presets(presets: &HashMap<String, Preset>) -> Self {
        let mut catalog = PresetCatalog::new();
        let mut user: Vec<(String, Preset)> = presets
            .iter()
            .filter(|(id, _)| !catalog.is_builtin(id))
            .map(|(id, preset)| {
                let mut preset = preset.clone();
                preset.is_user_preset = true;
                (id.clone(), preset)
            })
            .collect();
        user.sort_by(|(a, _), (b, _)| a.cmp(b));
        catalog.user = user;
        catalog
    }

    pub fn is_builtin(&self, preset_id: &str) -> bool {
        self.builtins.iter().any(|(id, _)| id == preset_id)
    }

    pub fn get(&self, preset_id: &str) -> Option<&Preset> {
        self.builtins
            .iter()
            .chain(&self.user)
            .find(|(id, _)| id == preset_id)
            .map(|(_, preset)| preset)
    }

    /// Every preset in catalog order: built-ins first, then user entries.
    /// A user entry whose id collides with a built-in is not listed; the
    /// built-in wins everywhere.
    pub fn all(&self) -> impl Iterator<Item = (&str, &Preset)> + '_ {
        self.builtins
            .iter()
            .chain(self.user.iter().filter(|(id, _)| !self.is_builtin(id)))
            .map(|(id, preset)| (id.as_str(), preset))
    }

    /// Save the given band configuration under `name`. The derived id
    /// overwrites any existing user entry with the same id.
    pub fn save(&mut self, name: &str, bands: &[Band]) -> String {
        let id = preset_id(name);
        let preset = Preset {
            name: name.to_string(),
            bands: bands.iter().map(PresetBand::from).collect(),
            is_user_preset: true,
        };
        if let Some(entry) = self.user.iter_mut().find(|(existing, _)| *existing == id) {
            entry.1 = preset;
        } else {
            self.user.push((id.clone(), preset));
        }
        id
    }

    /// Remove a user preset. Built-ins cannot be deleted; unknown ids and
    /// built-in ids both report `false`.
    pub fn delete(&mut self, preset_id: &str) -> bool {
        if self.is_builtin(preset_id) {
            return false;
        }
        let before = self.user.len();
        self.user.retain(|(id, _)| id != preset_id);
        self.user.len() != before
    }

    /// Classify a band configuration: the first preset (in catalog
    /// order) whose bands all match positionally within tolerance, or
    /// `None` for "custom".
    pub fn identify(&self, bands: &[Band]) -> Option<String> {
        self.all()
            .find(|(_, preset)| matches_preset(bands, preset))
            .map(|(id, _)| id.to_string())
    }

    /// The user presets, keyed by id, for persisting inside the settings
    /// object.
    pub fn user_presets(&self) -> HashMap<String, Preset> {
        self.user.iter().cloned().collect()
    }

    pub fn user_preset_count(&self) -> usize {
        self.user.len()
    }

    /// Rows for a preset selector: "Custom" first, then the catalog.
    pub fn selector_entries(&self) -> Vec<SelectorEntry> {
        let mut entries = vec![SelectorEntry {
            id: CUSTOM_PRESET_ID.to_string(),
            label: "Custom".to_string(),
            is_user_preset: false,
        }];
        entries.extend(self.all().map(|(id, preset)| SelectorEntry {
            id: id.to_string(),
            label: preset.name.clone(),
            is_user_preset: preset.is_user_preset,
        }));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::default_bands;

    fn bands_for(preset_id: &str) -> Vec<Band> {
        let catalog = PresetCatalog::new();
        let preset = catalog.get(preset_id).unwrap();
        default_bands()
            .into_iter()
            .zip(&preset.bands)
            .map(|(mut band, preset_band)| {
                band.frequency = preset_band.frequency;
                band.gain = preset_band.gain;
                band.q = preset_band.q;
                band.is_active = preset_band.is_active;
                band
            })
            .collect()
    }

    #[test]
    fn identifies_exact_builtin_configurations() {
        let catalog = PresetCatalog::new();
        assert_eq!(catalog.identify(&bands_for("flat")), Some("flat".to_string()));
        assert_eq!(
            catalog.identify(&bands_for("bass-boost")),
            Some("bass-boost".to_string())
        );
    }

    #[test]
    fn identify_tolerates_small_drift_only() {
        let catalog = PresetCatalog::new();

        let mut bands = bands_for("flat");
        bands[2].gain += 0.05;
        assert_eq!(
            catalog.identify(&bands),
            Some("flat".to_string()),
            "0.05 dB sits inside the 0.1 dB tolerance"
        );

        let mut bands = bands_for("flat");
        bands[2].gain += 0.2;
        assert_eq!(catalog.identify(&bands), None, "0.2 dB drift is custom");

        let mut bands = bands_for("flat");
        bands[4].q += 0.3;
        assert_eq!(catalog.identify(&bands), None);

        let mut bands = bands_for("flat");
        bands[0].is_active = false;
        assert_eq!(catalog.identify(&bands), None, "active flags must match exactly");
    }

    #[test]
    fn identify_compares_positionally_and_rejects_length_mismatch() {
        let catalog = PresetCatalog::new();
        let mut bands = bands_for("flat");
        bands.pop();
        assert_eq!(catalog.identify(&bands), None);
        assert_eq!(catalog.identify(&[]), None);
    }

    #[test]
    fn identify_returns_the_first_match_in_catalog_order() {
        let mut catalog = PresetCatalog::new();
        // A user copy of Flat can never win over the built-in.
        let id = catalog.save("Flat Copy", &bands_for("flat"));
        assert_eq!(id, "flat-copy");
        assert_eq!(catalog.identify(&bands_for("flat")), Some("flat".to_string()));
    }

    #[test]
    fn preset_ids_derive_from_names() {
        assert_eq!(preset_id("My Cool EQ!"), "my-cool-eq-");
        assert_eq!(preset_id("Bass Boost"), "bass-boost");
        assert_eq!(preset_id("2024 mix"), "2024-mix");
        assert_eq!(preset_id("caf\u{e9}"), "caf-");
    }

    #[test]
    fn saving_overwrites_on_id_collision() {
        let mut catalog = PresetCatalog::new();
        let mut bands = default_bands();
        bands[0].gain = 3.0;
        let first = catalog.save("My EQ", &bands);

        bands[0].gain = -3.0;
        let second = catalog.save("my eq", &bands);
        assert_eq!(first, second, "both names sanitize to the same id");
        assert_eq!(catalog.user_preset_count(), 1);
        assert_eq!(catalog.get("my-eq").unwrap().bands[0].gain, -3.0);
        assert_eq!(catalog.get("my-eq").unwrap().name, "my eq");
    }

    #[test]
    fn builtins_cannot_be_deleted_or_shadowed() {
        let mut catalog = PresetCatalog::new();
        assert!(!catalog.delete("flat"));
        assert!(catalog.get("flat").is_some());

        // A user save whose id collides with a built-in never shadows it
        // on lookup.
        let mut bands = default_bands();
        bands[3].gain = 5.0;
        catalog.save("Flat", &bands);
        assert_eq!(catalog.get("flat").unwrap().bands[3].gain, 0.0);
        assert_eq!(
            catalog.all().filter(|(id, _)| *id == "flat").count(),
            1,
            "the shadowed user entry is not listed"
        );

        assert!(!catalog.delete("never-existed"));
    }

    #[test]
    fn deleting_user_presets_removes_them() {
        let mut catalog = PresetCatalog::new();
        let id = catalog.save("Late Night", &default_bands());
        assert_eq!(catalog.user_preset_count(), 1);
        assert!(catalog.delete(&id));
        assert!(catalog.get(&id).is_none());
        assert!(!catalog.delete(&id), "second delete finds nothing");
    }

    #[test]
    fn persisted_user_presets_never_shadow_builtins() {
        let mut persisted = HashMap::new();
        persisted.insert(
            "flat".to_string(),
            Preset {
                name: "Flat".to_string(),
                bands: Vec::new(),
                is_user_preset: true,
            },
        );
        persisted.insert(
            "warm".to_string(),
            Preset {
                name: "Warm".to_string(),
                bands: default_bands().iter().map(PresetBand::from).collect(),
                is_user_preset: false,
            },
        );
        let catalog = PresetCatalog::with_user_presets(&persisted);
        assert_eq!(catalog.user_preset_count(), 1);
        assert!(!catalog.get("flat").unwrap().bands.is_empty());
        assert!(catalog.get("warm").unwrap().is_user_preset);
    }

    #[test]
    fn selector_lists_custom_then_builtins_then_user() {
        let mut catalog = PresetCatalog::new();
        catalog.save("Warm", &default_bands());
        let entries = catalog.selector_entries();

        assert_eq!(entries[0].id, CUSTOM_PRESET_ID);
        assert_eq!(entries[0].label, "Custom");
        assert_eq!(entries[1].id, "flat");
        assert_eq!(entries[4].id, "v-shaped");
        let last = entries.last().unwrap();
        assert_eq!(last.id, "warm");
        assert!(last.is_user_preset);
        assert!(
            entries[1..5].iter().all(|entry| !entry.is_user_preset),
            "built-ins carry no user marker"
        );
    }

    #[test]
    fn round_trips_through_the_settings_map() {
        let mut catalog = PresetCatalog::new();
        catalog.save("Night", &default_bands());
        catalog.save("Day", &default_bands());
        let persisted = catalog.user_presets();
        let reloaded = PresetCatalog::with_user_presets(&persisted);
        assert_eq!(reloaded.user_preset_count(), 2);
        assert!(reloaded.get("night").is_some());
        assert!(reloaded.get("day").is_some());
    }
}
