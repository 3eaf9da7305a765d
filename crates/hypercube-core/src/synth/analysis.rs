use std::ops::Range;

use crate::config::BandShaping;

/// Normalised band energies plus the frequency of the last note played.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnalysisLevels {
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
    pub frequency: f32,
}

/// Bin ranges for each band. Ranges are contiguous: every band after the first
/// starts one bin past the previous band's end.
pub fn band_bins(
    bands: &[BandShaping; 3],
    sample_rate: f32,
    bin_count: usize,
) -> [Range<usize>; 3] {
    let mut out: [Range<usize>; 3] = [0..0, 0..0, 0..0];
    if bin_count == 0 || !(sample_rate > 0.0) {
        return out;
    }
    let hz_per_bin = (sample_rate * 0.5) / bin_count as f32;
    let to_bin = |hz: f32| ((hz.max(0.0) / hz_per_bin).floor() as usize).min(bin_count - 1);

    let mut start = to_bin(bands[0].low_hz);
    for (i, band) in bands.iter().enumerate() {
        if start >= bin_count {
            break;
        }
        let end = to_bin(band.high_hz).max(start);
        out[i] = start..end + 1;
        start = end + 1;
    }
    out
}

fn shape(average: f32, band: &BandShaping) -> f32 {
    let normalized = (average / 255.0).clamp(0.0, 1.0);
    (normalized.powf(band.exponent) * band.gain).clamp(0.0, 1.0)
}

/// `[bass, mid, high]` in 0..=1 for one frame of analyser data.
pub fn compute_band_levels(data: &[u8], sample_rate: f32, bands: &[BandShaping; 3]) -> [f32; 3] {
    let ranges = band_bins(bands, sample_rate, data.len());
    let mut levels = [0.0; 3];
    for ((level, range), band) in levels.iter_mut().zip(ranges).zip(bands) {
        let Some(slice) = data.get(range) else {
            continue;
        };
        if slice.is_empty() {
            continue;
        }
        let sum: u32 = slice.iter().map(|&b| b as u32).sum();
        *level = shape(sum as f32 / slice.len() as f32, band);
    }
    levels
}
