use std::ops::Range;

/// Contrast values per frame: six octave bands above 200 Hz plus the band below.
pub const CONTRAST_VALUES: usize = 7;

const FIRST_EDGE_HZ: f32 = 200.0;
const QUANTILE: f32 = 0.02;
const POWER_FLOOR: f32 = 1e-10;

/// Octave sub-bands `[0, 200], [200, 400], …, [6400, nyquist]` as bin ranges.
///
/// Each upper band also takes the bin just below its lower edge. Every band
/// but the last then drops its top bin, while the quantile size is still
/// taken from the undropped band width.
pub(super) struct ContrastBands {
    bands: [Range<usize>; CONTRAST_VALUES],
    quantile_lens: [usize; CONTRAST_VALUES],
}

impl ContrastBands {
    pub(super) fn new(sample_rate: u32, fft_len: usize) -> Self {
        let fft_len = fft_len.max(2);
        let sr = sample_rate.max(1) as f32;
        let nyquist = sr * 0.5;
        let bin_count = fft_len / 2 + 1;
        let bin_hz = |bin: usize| bin as f32 * sr / fft_len as f32;
        let spans: [Range<usize>; CONTRAST_VALUES] = std::array::from_fn(|band| {
            let low = if band == 0 {
                0.0
            } else {
                FIRST_EDGE_HZ * 2.0_f32.powi(band as i32 - 1)
            };
            let high = FIRST_EDGE_HZ * 2.0_f32.powi(band as i32);
            if low > nyquist {
                return 0..0;
            }
            let mut start = (0..bin_count).find(|&bin| bin_hz(bin) >= low).unwrap_or(bin_count);
            let end = if band + 1 == CONTRAST_VALUES {
                bin_count
            } else {
                (0..bin_count)
                    .find(|&bin| bin_hz(bin) > high)
                    .unwrap_or(bin_count)
            };
            if start >= end {
                return 0..0;
            }
            if band > 0 {
                start = start.saturating_sub(1);
            }
            start..end
        });
        let quantile_lens = std::array::from_fn(|band| spans[band].len());
        let bands = std::array::from_fn(|band| {
            let span = spans[band].clone();
            if band + 1 < CONTRAST_VALUES && !span.is_empty() {
                span.start..span.end - 1
            } else {
                span
            }
        });
        Self {
            bands,
            quantile_lens,
        }
    }

    /// Peak-minus-valley contrast in dB for each band of one magnitude frame.
    ///
    /// Empty bands (above nyquist) contribute 0.
    pub(super) fn contrast(&self, magnitudes: &[f32]) -> [f32; CONTRAST_VALUES] {
        let mut out = [0.0_f32; CONTRAST_VALUES];
        let mut sorted = Vec::new();
        for ((value, band), quantile_len) in out
            .iter_mut()
            .zip(self.bands.iter())
            .zip(self.quantile_lens.iter())
        {
            let end = band.end.min(magnitudes.len());
            if band.start >= end {
                continue;
            }
            sorted.clear();
            sorted.extend_from_slice(&magnitudes[band.start..end]);
            sorted.sort_by(f32::total_cmp);
            let take = ((QUANTILE * *quantile_len as f32).round() as usize)
                .max(1)
                .min(sorted.len());
            let valley = mean(&sorted[..take]);
            let peak = mean(&sorted[sorted.len() - take..]);
            *value = to_db(peak) - to_db(valley);
        }
        out
    }
}

fn mean(values: &[f32]) -> f32 {
    values.iter().map(|v| *v as f64).sum::<f64>() as f32 / values.len().max(1) as f32
}

fn to_db(value: f32) -> f32 {
    10.0 * value.max(POWER_FLOOR).log10()
}
