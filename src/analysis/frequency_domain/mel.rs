/// Number of cepstral coefficients kept per frame.
pub const MFCC_COUNT: usize = 13;

/// Dynamic range kept by [`power_to_db_in_place`].
pub(super) const TOP_DB: f32 = 80.0;

const POWER_FLOOR: f32 = 1e-10;

/// Triangular mel filterbank with unit-area (Slaney) normalization.
pub(super) struct MelBank {
    filters: Vec<Vec<(usize, f32)>>,
}

impl MelBank {
    pub(super) fn new(
        sample_rate: u32,
        fft_len: usize,
        mel_bands: usize,
        f_min: f32,
        f_max: f32,
    ) -> Self {
        let sr = sample_rate.max(1) as f64;
        let fft_len = fft_len.max(2);
        let nyquist = sr * 0.5;
        let f_max = (f_max as f64).min(nyquist).max(f_min as f64);
        let mel_min = hz_to_mel(f_min as f64);
        let mel_max = hz_to_mel(f_max);
        let edges: Vec<f64> = (0..mel_bands + 2)
            .map(|i| {
                let t = i as f64 / (mel_bands + 1) as f64;
                mel_to_hz(mel_min + (mel_max - mel_min) * t)
            })
            .collect();
        let bin_hz: Vec<f64> = (0..=fft_len / 2)
            .map(|bin| bin as f64 * sr / fft_len as f64)
            .collect();
        let filters = (0..mel_bands)
            .map(|m| build_filter(&bin_hz, edges[m], edges[m + 1], edges[m + 2]))
            .collect();
        Self { filters }
    }

    #[cfg(test)]
    fn band_count(&self) -> usize {
        self.filters.len()
    }

    /// Mel-band energies of one power spectrum.
    pub(super) fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                filter
                    .iter()
                    .map(|&(bin, weight)| {
                        power.get(bin).copied().unwrap_or(0.0).max(0.0) as f64 * weight as f64
                    })
                    .sum::<f64>() as f32
            })
            .collect()
    }
}

fn build_filter(bin_hz: &[f64], left: f64, center: f64, right: f64) -> Vec<(usize, f32)> {
    let norm = 2.0 / (right - left).max(f64::EPSILON);
    let rise = (center - left).max(f64::EPSILON);
    let fall = (right - center).max(f64::EPSILON);
    bin_hz
        .iter()
        .enumerate()
        .filter_map(|(bin, &hz)| {
            let lower = (hz - left) / rise;
            let upper = (right - hz) / fall;
            let weight = lower.min(upper).max(0.0) * norm;
            (weight > 0.0).then_some((bin, weight as f32))
        })
        .collect()
}

const MEL_LINEAR_STEP: f64 = 200.0 / 3.0;
const MEL_LOG_START_HZ: f64 = 1_000.0;

fn mel_log_step() -> f64 {
    6.4_f64.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above.
fn hz_to_mel(hz: f64) -> f64 {
    let min_log_mel = MEL_LOG_START_HZ / MEL_LINEAR_STEP;
    if hz >= MEL_LOG_START_HZ {
        min_log_mel + (hz / MEL_LOG_START_HZ).ln() / mel_log_step()
    } else {
        hz / MEL_LINEAR_STEP
    }
}

fn mel_to_hz(mel: f64) -> f64 {
    let min_log_mel = MEL_LOG_START_HZ / MEL_LINEAR_STEP;
    if mel >= min_log_mel {
        MEL_LOG_START_HZ * (mel_log_step() * (mel - min_log_mel)).exp()
    } else {
        mel * MEL_LINEAR_STEP
    }
}

/// Convert power values to dB and clamp everything to `top_db` below the
/// global peak.
pub(super) fn power_to_db_in_place(frames: &mut [Vec<f32>], top_db: f32) {
    let mut peak = f32::NEG_INFINITY;
    for value in frames.iter_mut().flat_map(|frame| frame.iter_mut()) {
        *value = 10.0 * value.max(POWER_FLOOR).log10();
        peak = peak.max(*value);
    }
    let floor = peak - top_db;
    for value in frames.iter_mut().flat_map(|frame| frame.iter_mut()) {
        *value = value.max(floor);
    }
}

/// First [`MFCC_COUNT`] orthonormal DCT-II coefficients of a mel dB frame.
pub(super) fn mfcc_from_db(mel_db: &[f32]) -> [f32; MFCC_COUNT] {
    let mut out = [0.0_f32; MFCC_COUNT];
    let n = mel_db.len();
    if n == 0 {
        return out;
    }
    let scale_first = (1.0 / n as f64).sqrt();
    let scale_rest = (2.0 / n as f64).sqrt();
    for (k, coeff) in out.iter_mut().enumerate() {
        let mut sum = 0.0_f64;
        for (m, &v) in mel_db.iter().enumerate() {
            let angle = std::f64::consts::PI * k as f64 * (m as f64 + 0.5) / n as f64;
            sum += v as f64 * angle.cos();
        }
        let scale = if k == 0 { scale_first } else { scale_rest };
        *coeff = (sum * scale) as f32;
    }
    out
}
