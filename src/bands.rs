use std::collections::HashMap;

#[cfg(feature = "persistence")]
use serde::{Deserialize, Serialize};

use crate::presets::Preset;

pub const NUM_BANDS: usize = 6;

pub const MIN_FREQUENCY: f64 = 20.0;
pub const MAX_FREQUENCY: f64 = 20000.0;
pub const MIN_GAIN: f64 = -12.0;
pub const MAX_GAIN: f64 = 12.0;
pub const MIN_Q: f64 = 0.1;
pub const MAX_Q: f64 = 10.0;

/// Default band layout: (center frequency in Hz, Q, display color).
pub const DEFAULT_BANDS: [(f64, f64, &str); NUM_BANDS] = [
    (60.0, 0.8, "#EC407A"),
    (250.0, 1.0, "#7E57C2"),
    (1000.0, 1.2, "#29B6F6"),
    (4000.0, 1.5, "#66BB6A"),
    (8000.0, 1.0, "#FFCA28"),
    (16000.0, 0.8, "#FF7043"),
];

/// One stage of the equalizer filter chain.
///
/// Bands are value objects: mutated in place during editing and only
/// replaced wholesale when a preset is applied. `id` is stable for the
/// lifetime of a configuration and never reused.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persistence", derive(Serialize, Deserialize))]
pub struct Band {
    pub id: u32,
    pub frequency: f64,
    pub gain: f64,
    pub q: f64,
    pub is_active: bool,
    /// Display-only tag, never used in computation.
    pub color: String,
}

/// Filter role, derived from chain position: the first band is a low
/// shelf, the last a high shelf, everything in between peaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandRole {
    LowShelf,
    Peaking,
    HighShelf,
}

impl BandRole {
    /// Role of the band at `index` in a chain of `count` bands.
    /// A single-band chain counts as a low shelf.
    pub fn of(index: usize, count: usize) -> BandRole {
        if index == 0 {
            BandRole::LowShelf
        } else if index + 1 == count {
            BandRole::HighShelf
        } else {
            BandRole::Peaking
        }
    }

    /// Role by band id for the default 1..=count layout.
    pub fn of_id(id: u32, count: usize) -> BandRole {
        BandRole::of((id as usize).saturating_sub(1), count)
    }
}

pub fn clamp_frequency(frequency: f64) -> f64 {
    frequency.clamp(MIN_FREQUENCY, MAX_FREQUENCY)
}

pub fn clamp_gain(gain: f64) -> f64 {
    gain.clamp(MIN_GAIN, MAX_GAIN)
}

pub fn clamp_q(q: f64) -> f64 {
    q.clamp(MIN_Q, MAX_Q)
}

/// The reference configuration: six bands, flat gain, all active.
pub fn default_bands() -> Vec<Band> {
    DEFAULT_BANDS
        .iter()
        .enumerate()
        .map(|(index, &(frequency, q, color))| Band {
            id: index as u32 + 1,
            frequency,
            gain: 0.0,
            q,
            is_active: true,
            color: color.to_string(),
        })
        .collect()
}

/// Per-channel snapshot stored inside [`EqSettings::channel_settings`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persistence", derive(Serialize, Deserialize))]
pub struct ChannelSettings {
    pub is_active: bool,
    pub bands: Vec<Band>,
    pub channel_name: Option<String>,
}

/// The full persisted settings tree. Loaded and saved wholesale; the
/// persistence collaborator never patches individual fields.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persistence", derive(Serialize, Deserialize))]
pub struct EqSettings {
    pub is_active: bool,
    pub theme_is_dark: bool,
    pub bands: Vec<Band>,
    #[cfg_attr(feature = "persistence", serde(default))]
    pub channel_settings: HashMap<String, ChannelSettings>,
    /// User presets, keyed by preset id. Built-ins are code, not data.
    #[cfg_attr(feature = "persistence", serde(default))]
    pub presets: HashMap<String, Preset>,
}

impl Default for EqSettings {
    fn default() -> Self {
        EqSettings {
            is_active: true,
            theme_is_dark: false,
            bands: default_bands(),
            channel_settings: HashMap::new(),
            presets: HashMap::new(),
        }
    }
}

impl EqSettings {
    /// Snapshot the current band state for one channel.
    pub fn remember_channel(&mut self, channel_id: &str, channel_name: Option<String>) {
        self.channel_settings.insert(
            channel_id.to_string(),
            ChannelSettings {
                is_active: self.is_active,
                bands: self.bands.clone(),
                channel_name,
            },
        );
    }

    /// Restore a previously remembered channel snapshot.
    /// Unknown channel ids leave the settings untouched.
    pub fn recall_channel(&mut self, channel_id: &str) -> bool {
        match self.channel_settings.get(channel_id) {
            Some(snapshot) => {
                self.is_active = snapshot.is_active;
                self.bands = snapshot.bands.clone();
                true
            }
            None => false,
        }
    }
}

/// Normalize a channel name into a stable channel id: lowercase, with
/// every character outside `[a-z0-9]` replaced by `_`.
pub fn channel_id(channel_name: &str) -> String {
    channel_name
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}
