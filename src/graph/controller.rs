//! Stateful handle-per-band editing model: drag to move a band in
//! frequency/gain space, wheel to adjust Q, with a floating readout and
//! the live spectrum animation flag. All drawing goes through the
//! [`RenderTarget`] seam; all clock reads come from the caller.

use std::time::{Duration, Instant};

use crate::bands::{self, Band};
use crate::engine::AudioEngine;

use super::mapping::{
    format_frequency, format_gain, format_q, frequency_to_x, gain_to_y, x_to_frequency, y_to_gain,
};
use super::response::render_curve;
use super::spectrum::spectrum_bars;
use super::{PlotBounds, Readout, RenderTarget, CURVE_SAMPLES, HANDLE_RADIUS};

/// How long the readout lingers after the last interaction.
pub const READOUT_HIDE_DELAY: Duration = Duration::from_millis(2000);

/// Q change per wheel tick.
pub const WHEEL_Q_STEP: f64 = 0.1;

/// On-graph representation of one band's frequency/gain position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub band_id: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    /// Last pointer position, the baseline for the next movement delta.
    Dragging { last_x: f64, last_y: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Position,
    Q,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
}

/// Notifications for the integration layer. `Changed` fires on every
/// intermediate edit (debounce these before touching the audio engine);
/// `ChangeComplete` marks a settled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    Changed { band_id: u32, parameter: Parameter },
    ChangeComplete { band_id: u32 },
}

pub struct GraphController {
    bounds: PlotBounds,
    bands: Vec<Band>,
    handles: Vec<Handle>,
    active_band: Option<u32>,
    drag: DragState,
    readout_hide_at: Option<Instant>,
    spectrum_active: bool,
}

impl GraphController {
    pub fn new(bounds: PlotBounds, bands: Vec<Band>) -> Self {
        let handles = compute_handles(&bands, &bounds);
        GraphController {
            bounds,
            bands,
            handles,
            active_band: None,
            drag: DragState::Idle,
            readout_hide_at: None,
            spectrum_active: false,
        }
    }

    pub fn bounds(&self) -> &PlotBounds {
        &self.bounds
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band(&self, band_id: u32) -> Option<&Band> {
        self.bands.iter().find(|band| band.id == band_id)
    }

    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    pub fn active_band(&self) -> Option<u32> {
        self.active_band
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Push the full current state (handles + curve) to the target.
    /// Used on startup and whenever the band set is replaced wholesale.
    pub fn rebuild_handles(&self, target: &mut dyn RenderTarget) {
        target.clear_handles();
        for (handle, band) in self.handles.iter().zip(&self.bands) {
            target.add_handle(handle.band_id, handle.x, handle.y, &band.color);
        }
        self.redraw_curve(target);
    }

    /// Replace the whole band set (preset application). Handles are
    /// rebuilt in lockstep, never patched individually.
    pub fn replace_bands(&mut self, bands: Vec<Band>, target: &mut dyn RenderTarget) {
        self.bands = bands;
        self.handles = compute_handles(&self.bands, &self.bounds);
        self.active_band = None;
        self.drag = DragState::Idle;
        self.rebuild_handles(target);
    }

    /// Reposition one handle after its band's parameters were edited
    /// elsewhere (slider, keyboard). Unknown ids are a silent no-op.
    pub fn refresh_handle(&mut self, band_id: u32, target: &mut dyn RenderTarget) {
        let Some(band) = self.bands.iter().find(|band| band.id == band_id) else {
            return;
        };
        let (x, y) = handle_position(band, &self.bounds);
        if let Some(handle) = self.handles.iter_mut().find(|h| h.band_id == band_id) {
            handle.x = x;
            handle.y = y;
        }
        target.set_handle_position(band_id, x, y);
        self.redraw_curve(target);
    }

    pub fn set_frequency(&mut self, band_id: u32, frequency: f64, target: &mut dyn RenderTarget) {
        let Some(band) = self.bands.iter_mut().find(|band| band.id == band_id) else {
            return;
        };
        band.frequency = bands::clamp_frequency(frequency);
        self.refresh_handle(band_id, target);
    }

    pub fn set_gain(&mut self, band_id: u32, gain: f64, target: &mut dyn RenderTarget) {
        let Some(band) = self.bands.iter_mut().find(|band| band.id == band_id) else {
            return;
        };
        band.gain = bands::clamp_gain(gain);
        self.refresh_handle(band_id, target);
    }

    pub fn set_q(&mut self, band_id: u32, q: f64, target: &mut dyn RenderTarget) {
        let Some(band) = self.bands.iter_mut().find(|band| band.id == band_id) else {
            return;
        };
        band.q = bands::clamp_q(q);
        self.redraw_curve(target);
    }

    /// Flip a band's active flag. Returns the new state, or `None` for a
    /// stale id.
    pub fn toggle_band(&mut self, band_id: u32, target: &mut dyn RenderTarget) -> Option<bool> {
        let band = self.bands.iter_mut().find(|band| band.id == band_id)?;
        band.is_active = !band.is_active;
        let state = band.is_active;
        self.redraw_curve(target);
        Some(state)
    }

    /// Pointer press in plot coordinates. Captures the topmost handle
    /// under the pointer and enters `Dragging`; returns whether a handle
    /// was hit.
    pub fn pointer_down(&mut self, x: f64, y: f64, target: &mut dyn RenderTarget) -> bool {
        let Some(handle) = self
            .handles
            .iter()
            .rev()
            .find(|handle| hits_handle(handle, x, y))
        else {
            return false;
        };
        self.active_band = Some(handle.band_id);
        self.drag = DragState::Dragging { last_x: x, last_y: y };
        self.readout_hide_at = None;
        self.update_readout(target);
        true
    }

    /// Pointer movement while dragging: apply the delta since the last
    /// position to the handle, clamp to the plot, convert back to
    /// frequency/gain, and redraw. Outside a drag this is a no-op.
    pub fn pointer_move(
        &mut self,
        x: f64,
        y: f64,
        target: &mut dyn RenderTarget,
    ) -> Option<GraphEvent> {
        let DragState::Dragging { last_x, last_y } = self.drag else {
            return None;
        };
        let band_id = self.active_band?;
        let handle = self.handles.iter_mut().find(|h| h.band_id == band_id)?;

        let new_x = self.bounds.clamp_x(handle.x + (x - last_x));
        let new_y = self.bounds.clamp_y(handle.y + (y - last_y));
        handle.x = new_x;
        handle.y = new_y;
        target.set_handle_position(band_id, new_x, new_y);

        let frequency = x_to_frequency(
            new_x,
            self.bounds.min_frequency,
            self.bounds.max_frequency,
            self.bounds.min_x,
            self.bounds.max_x,
        );
        let gain = y_to_gain(
            new_y,
            self.bounds.min_gain,
            self.bounds.max_gain,
            self.bounds.min_y,
            self.bounds.max_y,
        );
        if let Some(band) = self.bands.iter_mut().find(|band| band.id == band_id) {
            band.frequency = frequency;
            band.gain = gain;
        }

        self.update_readout(target);
        self.redraw_curve(target);
        self.drag = DragState::Dragging { last_x: x, last_y: y };

        Some(GraphEvent::Changed {
            band_id,
            parameter: Parameter::Position,
        })
    }

    /// Pointer release, wherever it happens (the caller listens globally
    /// so a drag can never get stuck). Resolves to `Idle` and schedules
    /// the readout auto-hide.
    pub fn pointer_up(&mut self, now: Instant) -> Option<GraphEvent> {
        if !self.is_dragging() {
            return None;
        }
        self.drag = DragState::Idle;
        self.readout_hide_at = Some(now + READOUT_HIDE_DELAY);
        self.active_band
            .map(|band_id| GraphEvent::ChangeComplete { band_id })
    }

    /// Wheel tick over a handle: adjust that band's Q by
    /// [`WHEEL_Q_STEP`], scroll-down decreasing. Only handled while idle;
    /// emits both a change and a change-complete notification.
    pub fn wheel(
        &mut self,
        x: f64,
        y: f64,
        direction: WheelDirection,
        now: Instant,
        target: &mut dyn RenderTarget,
    ) -> Vec<GraphEvent> {
        if self.is_dragging() {
            return Vec::new();
        }
        let Some(handle) = self
            .handles
            .iter()
            .rev()
            .find(|handle| hits_handle(handle, x, y))
        else {
            return Vec::new();
        };
        let band_id = handle.band_id;
        let Some(band) = self.bands.iter_mut().find(|band| band.id == band_id) else {
            return Vec::new();
        };

        let step = match direction {
            WheelDirection::Up => WHEEL_Q_STEP,
            WheelDirection::Down => -WHEEL_Q_STEP,
        };
        band.q = bands::clamp_q(band.q + step);

        self.active_band = Some(band_id);
        self.update_readout(target);
        self.readout_hide_at = Some(now + READOUT_HIDE_DELAY);
        self.redraw_curve(target);

        vec![
            GraphEvent::Changed {
                band_id,
                parameter: Parameter::Q,
            },
            GraphEvent::ChangeComplete { band_id },
        ]
    }

    /// Drive time-based state: hides the readout once its deadline has
    /// passed and no drag is in progress.
    pub fn tick(&mut self, now: Instant, target: &mut dyn RenderTarget) {
        if let Some(deadline) = self.readout_hide_at {
            if now >= deadline && !self.is_dragging() {
                target.hide_readout();
                self.readout_hide_at = None;
            }
        }
    }

    pub fn start_spectrum_animation(&mut self) {
        self.spectrum_active = true;
    }

    pub fn stop_spectrum_animation(&mut self) {
        self.spectrum_active = false;
    }

    pub fn spectrum_animation_active(&self) -> bool {
        self.spectrum_active
    }

    /// One pass of the spectrum animation loop: pull a fresh snapshot
    /// from the engine and redraw the bars. Returns whether the loop
    /// should reschedule; once stopped, no further frame runs.
    pub fn spectrum_frame(
        &mut self,
        engine: &mut dyn AudioEngine,
        target: &mut dyn RenderTarget,
    ) -> bool {
        if !self.spectrum_active {
            return false;
        }
        if let Some(snapshot) = engine.spectrum_snapshot() {
            target.draw_spectrum_bars(&spectrum_bars(&snapshot, &self.bounds));
        }
        self.spectrum_active
    }

    fn redraw_curve(&self, target: &mut dyn RenderTarget) {
        target.set_curve(&render_curve(&self.bands, CURVE_SAMPLES, &self.bounds));
    }

    fn update_readout(&self, target: &mut dyn RenderTarget) {
        let Some(band_id) = self.active_band else {
            return;
        };
        let (Some(band), Some(handle)) = (
            self.bands.iter().find(|band| band.id == band_id),
            self.handles.iter().find(|h| h.band_id == band_id),
        ) else {
            return;
        };
        let (x, y) = readout_position(handle.x, handle.y, &self.bounds);
        target.show_readout(&Readout {
            band_id,
            x,
            y,
            frequency: format_frequency(band.frequency),
            gain: format_gain(band.gain),
            q: format_q(band.q),
        });
    }
}

fn handle_position(band: &Band, bounds: &PlotBounds) -> (f64, f64) {
    (
        frequency_to_x(
            band.frequency,
            bounds.min_frequency,
            bounds.max_frequency,
            bounds.min_x,
            bounds.max_x,
        ),
        gain_to_y(
            band.gain,
            bounds.min_gain,
            bounds.max_gain,
            bounds.min_y,
            bounds.max_y,
        ),
    )
}

fn compute_handles(bands: &[Band], bounds: &PlotBounds) -> Vec<Handle> {
    bands
        .iter()
        .map(|band| {
            let (x, y) = handle_position(band, bounds);
            Handle {
                band_id: band.id,
                x,
                y,
            }
        })
        .collect()
}

fn hits_handle(handle: &Handle, x: f64, y: f64) -> bool {
    let dx = x - handle.x;
    let dy = y - handle.y;
    dx * dx + dy * dy <= HANDLE_RADIUS * HANDLE_RADIUS
}

/// Place the readout next to a handle, flipped away from the nearest
/// plot edges and clamped fully inside the plot box.
pub fn readout_position(handle_x: f64, handle_y: f64, bounds: &PlotBounds) -> (f64, f64) {
    let x = if handle_x > bounds.center_x() {
        handle_x - 110.0
    } else {
        handle_x + 10.0
    };
    let y = if handle_y > bounds.center_y() {
        handle_y - 60.0
    } else {
        handle_y + 5.0
    };
    (
        x.clamp(5.0, bounds.max_x - 100.0),
        y.clamp(5.0, bounds.min_y - 60.0),
    )
}
