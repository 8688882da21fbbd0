//! Contract with the external real-time audio engine. The core only
//! configures filter stages and reads spectrum snapshots; it never owns
//! an audio graph itself.

use std::time::{Duration, Instant};

use crate::bands::{Band, BandRole};

/// Quiet period before coalesced parameter changes reach the engine.
pub const ENGINE_UPDATE_DEBOUNCE: Duration = Duration::from_millis(100);

/// A point-in-time copy of the engine's analyser output: one unsigned
/// byte magnitude (0-255) per frequency bin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpectrumSnapshot {
    pub data: Vec<u8>,
}

impl SpectrumSnapshot {
    pub fn bin_count(&self) -> usize {
        self.data.len()
    }
}

/// Parameters for one filter stage. `q` is only present for peaking
/// stages; the shelf stages keep whatever bandwidth the engine gives them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageParams {
    pub frequency: f64,
    pub gain: f64,
    pub q: Option<f64>,
}

/// Translate the band array into per-stage parameters, index for index.
/// Inactive bands are driven to 0 dB rather than skipped so the stage
/// count stays fixed.
pub fn stage_params(bands: &[Band]) -> Vec<StageParams> {
    let count = bands.len();
    bands
        .iter()
        .enumerate()
        .map(|(index, band)| StageParams {
            frequency: band.frequency,
            gain: if band.is_active { band.gain } else { 0.0 },
            q: (BandRole::of(index, count) == BandRole::Peaking).then_some(band.q),
        })
        .collect()
}

pub trait AudioEngine {
    /// Retune the filter stage at `index`.
    fn set_stage(&mut self, index: usize, params: StageParams);

    /// Push the whole band array to the engine, one stage per band.
    fn apply_bands(&mut self, bands: &[Band]) {
        for (index, params) in stage_params(bands).into_iter().enumerate() {
            self.set_stage(index, params);
        }
    }

    /// Global bypass: disconnect the filter chain and fall back to
    /// pass-through, or reconnect it.
    fn set_bypass(&mut self, bypass: bool);

    /// The engine's current spectrum sample snapshot, if the analyser is
    /// ready.
    fn spectrum_snapshot(&mut self) -> Option<SpectrumSnapshot>;
}

/// Coalesces rapid parameter-change notifications into a single
/// downstream update: every change restarts the quiet period, and the
/// update fires once after it elapses. Drives no clock of its own; the
/// caller supplies `Instant`s.
#[derive(Debug, Default)]
pub struct UpdateDebouncer {
    deadline: Option<Instant>,
}

impl UpdateDebouncer {
    pub fn new() -> Self {
        UpdateDebouncer::default()
    }

    /// Record a change at `now`, restarting the quiet period.
    pub fn mark(&mut self, now: Instant) {
        self.deadline = Some(now + ENGINE_UPDATE_DEBOUNCE);
    }

    /// Drop any pending update (used when the caller flushed directly).
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once per quiet period: when the deadline has passed,
    /// the pending update is consumed and the caller should flush.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
