//! Approximate combined magnitude response of the shelf/peak filter
//! chain, and the renderable curve derived from it.
//!
//! The per-band formulas are intentionally simplified closed forms tuned
//! for smooth visual rendering, not audio-accurate transfer functions:
//! the shelves roll off with a fourth-power ratio term and the peaking
//! bands are bell curves in log-frequency space with width 1/Q.

use crate::bands::{Band, BandRole};

use super::{mapping, PlotBounds, Point};

/// Response of a single band at `frequency`, in dB. Inactive bands
/// contribute nothing regardless of their stored gain.
fn band_response(band: &Band, role: BandRole, frequency: f64) -> f64 {
    if !band.is_active {
        return 0.0;
    }
    match role {
        BandRole::LowShelf => {
            if frequency <= band.frequency {
                band.gain
            } else {
                band.gain / (1.0 + (frequency / band.frequency).powi(4))
            }
        }
        BandRole::HighShelf => {
            if frequency >= band.frequency {
                band.gain
            } else {
                band.gain / (1.0 + (band.frequency / frequency).powi(4))
            }
        }
        BandRole::Peaking => {
            let bandwidth = 1.0 / band.q;
            let distance = (frequency / band.frequency).ln() / bandwidth;
            band.gain / (1.0 + distance * distance)
        }
    }
}

/// Combined response of the whole chain at `frequency`, in dB.
///
/// Contributions are summed, not averaged, so the net response may exceed
/// the nominal gain range; callers render the overshoot rather than
/// clamping it.
pub fn combined_response(bands: &[Band], frequency: f64) -> f64 {
    let count = bands.len();
    bands
        .iter()
        .enumerate()
        .map(|(index, band)| band_response(band, BandRole::of(index, count), frequency))
        .sum()
}

/// The renderable response curve: `sample_count + 1` line samples
/// followed by two closing points along the bottom plot edge, forming a
/// fillable outline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurvePath {
    pub points: Vec<Point>,
}

impl CurvePath {
    /// The line samples, without the two closing fill points.
    pub fn samples(&self) -> &[Point] {
        let len = self.points.len();
        &self.points[..len.saturating_sub(2)]
    }
}

/// Sample the combined response at logarithmically even frequency steps
/// across the plot and close the outline along the bottom edge. The curve
/// is recomputed from scratch on every call; at O(samples x bands) this
/// is cheap enough for every interaction tick.
pub fn render_curve(bands: &[Band], sample_count: usize, bounds: &PlotBounds) -> CurvePath {
    let sample_count = sample_count.max(1);
    let mut points = Vec::with_capacity(sample_count + 3);
    let log_min = bounds.min_frequency.log10();
    let log_max = bounds.max_frequency.log10();

    for i in 0..=sample_count {
        let percent = i as f64 / sample_count as f64;
        let frequency = 10f64.powf(log_min + percent * (log_max - log_min));
        let gain = combined_response(bands, frequency);
        points.push(Point {
            x: bounds.min_x + percent * bounds.width(),
            y: mapping::gain_to_y(gain, bounds.min_gain, bounds.max_gain, bounds.min_y, bounds.max_y),
        });
    }

    points.push(Point { x: bounds.max_x, y: bounds.min_y });
    points.push(Point { x: bounds.min_x, y: bounds.min_y });

    CurvePath { points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::default_bands;
    use crate::graph::CURVE_SAMPLES;

    fn single_low_shelf(frequency: f64, gain: f64) -> Vec<Band> {
        vec![Band {
            id: 1,
            frequency,
            gain,
            q: 0.8,
            is_active: true,
            color: "#EC407A".to_string(),
        }]
    }

    #[test]
    fn flat_bands_respond_flat() {
        let bands = default_bands();
        let mut frequency = 20.0;
        while frequency <= 20000.0 {
            assert_eq!(
                combined_response(&bands, frequency),
                0.0,
                "zero-gain chain must be flat at {} Hz",
                frequency
            );
            frequency *= 2.0;
        }
    }

    #[test]
    fn inactive_bands_contribute_nothing() {
        let mut bands = default_bands();
        for band in &mut bands {
            band.gain = 9.0;
            band.is_active = false;
        }
        assert_eq!(combined_response(&bands, 1000.0), 0.0);
    }

    #[test]
    fn low_shelf_holds_full_gain_below_corner() {
        let bands = single_low_shelf(60.0, 8.0);
        assert_eq!(combined_response(&bands, 20.0), 8.0);
        assert_eq!(combined_response(&bands, 60.0), 8.0);
    }

    #[test]
    fn low_shelf_rolls_off_above_corner() {
        let bands = single_low_shelf(60.0, 8.0);
        let at_6k = combined_response(&bands, 6000.0);
        assert!(at_6k > 0.0 && at_6k < 0.01, "expected near-zero, got {}", at_6k);
        assert!(
            combined_response(&bands, 120.0) > at_6k,
            "roll-off must decrease with distance from the corner"
        );
    }

    #[test]
    fn high_shelf_mirrors_the_low_shelf() {
        let mut bands = single_low_shelf(8000.0, 6.0);
        bands[0].id = 2;
        // Two bands so the second is the chain's high shelf.
        bands.insert(
            0,
            Band {
                id: 1,
                frequency: 60.0,
                gain: 0.0,
                q: 0.8,
                is_active: true,
                color: "#EC407A".to_string(),
            },
        );
        assert_eq!(combined_response(&bands, 16000.0), 6.0);
        assert_eq!(combined_response(&bands, 8000.0), 6.0);
        let at_100 = combined_response(&bands, 100.0);
        assert!(at_100 < 0.01, "far below the corner the shelf dies out, got {}", at_100);
    }

    #[test]
    fn peaking_band_is_widest_at_low_q() {
        let mut bands = default_bands();
        bands[2].gain = 6.0; // 1 kHz peaking band
        let narrow_center = combined_response(&bands, 1000.0);
        assert!((narrow_center - 6.0).abs() < 1e-9, "full gain at the center frequency");

        let off_center_low_q = {
            bands[2].q = 0.5;
            combined_response(&bands, 2000.0)
        };
        let off_center_high_q = {
            bands[2].q = 5.0;
            combined_response(&bands, 2000.0)
        };
        assert!(
            off_center_low_q > off_center_high_q,
            "higher Q must narrow the bell ({} vs {})",
            off_center_low_q,
            off_center_high_q
        );
    }

    #[test]
    fn summed_response_may_exceed_display_range() {
        let mut bands = default_bands();
        for band in &mut bands {
            band.gain = 12.0;
        }
        let at_250 = combined_response(&bands, 250.0);
        assert!(at_250 > 12.0, "stacked bands clip past the nominal range, got {}", at_250);
    }

    #[test]
    fn curve_has_samples_plus_closing_points() {
        let bounds = PlotBounds::default();
        let curve = render_curve(&default_bands(), CURVE_SAMPLES, &bounds);
        assert_eq!(curve.points.len(), 203);
        assert_eq!(curve.samples().len(), 201);

        let closing = &curve.points[201..];
        assert_eq!(closing[0], Point { x: bounds.max_x, y: bounds.min_y });
        assert_eq!(closing[1], Point { x: bounds.min_x, y: bounds.min_y });
    }

    #[test]
    fn curve_spans_the_plot_left_to_right() {
        let bounds = PlotBounds::default();
        let curve = render_curve(&default_bands(), CURVE_SAMPLES, &bounds);
        let samples = curve.samples();
        assert_eq!(samples[0].x, bounds.min_x);
        assert_eq!(samples[samples.len() - 1].x, bounds.max_x);
        // Flat chain renders along the 0 dB line.
        assert!(samples.iter().all(|p| (p.y - bounds.center_y()).abs() < 1e-9));
    }
}
