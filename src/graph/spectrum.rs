//! Geometry of the live spectrum overlay: a fixed number of bars across
//! the plot width, fed by logarithmically spaced bins from the engine's
//! magnitude snapshot.

use crate::engine::SpectrumSnapshot;

use super::{PlotBounds, SpectrumBar};

/// Fraction of the plot height a full-scale (255) bin reaches.
const BAR_HEIGHT_SCALE: f64 = 0.8;
const BAR_SPACING: f64 = 1.0;

/// Pick the snapshot bin backing bar `index` of `total_bars`. Indices are
/// logarithmically spaced over the first quarter of the bins, which
/// approximates the audible range of a full-rate magnitude array.
pub fn bar_bin_index(index: usize, total_bars: usize, bin_count: usize) -> usize {
    let percent = index as f64 / total_bars as f64;
    let log_max = (bin_count as f64 / 4.0).log10();
    let bin = 10f64.powf(percent * log_max).floor() as usize;
    bin.min(bin_count.saturating_sub(1))
}

/// Lay out the spectrum bars for one snapshot. Bars sit on the bottom
/// plot edge; height scales linearly with magnitude, with a 1 px floor so
/// silence still reads as a baseline.
pub fn spectrum_bars(snapshot: &SpectrumSnapshot, bounds: &PlotBounds) -> Vec<SpectrumBar> {
    let bin_count = snapshot.bin_count();
    if bin_count == 0 {
        return Vec::new();
    }

    let bar_width = (bounds.width() / 128.0).floor().max(1.0);
    let total_bars = (bounds.width() / (bar_width + BAR_SPACING)).floor() as usize;

    let mut bars = Vec::with_capacity(total_bars);
    for index in 0..total_bars {
        let bin = bar_bin_index(index, total_bars, bin_count);
        let value = snapshot.data[bin] as f64;
        let height = ((value / 255.0) * bounds.height() * BAR_HEIGHT_SCALE).max(1.0);
        bars.push(SpectrumBar {
            x: bounds.min_x + index as f64 * (bar_width + BAR_SPACING),
            y: bounds.min_y - height,
            width: bar_width,
            height,
        });
    }
    bars
}
