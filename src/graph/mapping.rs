//! Conversions between the logarithmic frequency axis, the linear gain
//! axis, and plot pixel space, plus the display formatters for the
//! parameter readout. All functions are pure and total: out-of-domain
//! inputs saturate at the domain edges instead of erroring.

/// Map a frequency to an x coordinate on the logarithmic axis.
/// Frequencies outside `[min_freq, max_freq]` (including non-positive
/// values, which have no logarithm) are clamped into the domain first.
pub fn frequency_to_x(frequency: f64, min_freq: f64, max_freq: f64, min_x: f64, max_x: f64) -> f64 {
    let frequency = frequency.clamp(min_freq, max_freq);
    let log_min = min_freq.log10();
    let log_max = max_freq.log10();
    let percent = (frequency.log10() - log_min) / (log_max - log_min);
    min_x + percent * (max_x - min_x)
}

/// Inverse of [`frequency_to_x`]. `x` is clamped into `[min_x, max_x]`
/// before conversion; there is no extrapolation past the plot edges.
pub fn x_to_frequency(x: f64, min_freq: f64, max_freq: f64, min_x: f64, max_x: f64) -> f64 {
    let x = x.clamp(min_x, max_x);
    let log_min = min_freq.log10();
    let log_max = max_freq.log10();
    let percent = (x - min_x) / (max_x - min_x);
    10f64.powf(log_min + percent * (log_max - log_min))
}

/// Map a gain in dB to a y coordinate. The axis is inverted (y grows
/// downward), so larger gains land closer to `max_y`. Gain is not
/// clamped: a combined response beyond the nominal gain range maps to a
/// coordinate outside the plot, which renderers draw as-is.
pub fn gain_to_y(gain: f64, min_gain: f64, max_gain: f64, min_y: f64, max_y: f64) -> f64 {
    let percent = (gain - min_gain) / (max_gain - min_gain);
    min_y - percent * (min_y - max_y)
}

/// Inverse of [`gain_to_y`]. `y` is clamped into `[max_y, min_y]` first.
pub fn y_to_gain(y: f64, min_gain: f64, max_gain: f64, min_y: f64, max_y: f64) -> f64 {
    let y = y.clamp(max_y, min_y);
    let percent = (min_y - y) / (min_y - max_y);
    min_gain + percent * (max_gain - min_gain)
}

pub fn format_frequency(frequency: f64) -> String {
    if frequency >= 1000.0 {
        format!("{:.1} kHz", frequency / 1000.0)
    } else {
        format!("{} Hz", frequency.round() as i64)
    }
}

pub fn format_gain(gain: f64) -> String {
    let gain = if gain == 0.0 { 0.0 } else { gain };
    let prefix = if gain > 0.0 { "+" } else { "" };
    format!("{}{:.1} dB", prefix, gain)
}

pub fn format_q(q: f64) -> String {
    format!("Q: {:.1}", q)
}
