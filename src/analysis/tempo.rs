//! Global tempo estimate from an autocorrelation tempogram of the onset envelope.

use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex32};

use super::fft::hann_window;

/// Length of the local autocorrelation window.
pub(crate) const TEMPO_WINDOW_SECONDS: f32 = 8.0;
const MIN_BPM: f32 = 30.0;
const MAX_BPM: f32 = 320.0;
const PRIOR_BPM: f32 = 120.0;
const PRIOR_OCTAVES: f32 = 1.0;

/// Onset strength per frame: mean positive first difference of a mel dB
/// spectrogram across bands. The first frame has no predecessor and is 0.
pub(crate) fn onset_strength(mel_db: &[Vec<f32>]) -> Vec<f32> {
    let mut envelope = Vec::with_capacity(mel_db.len());
    if mel_db.is_empty() {
        return envelope;
    }
    envelope.push(0.0);
    for pair in mel_db.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);
        let bands = current.len().min(prev.len()).max(1);
        let rise: f64 = current
            .iter()
            .zip(prev)
            .map(|(c, p)| (c - p).max(0.0) as f64)
            .sum();
        envelope.push((rise / bands as f64) as f32);
    }
    envelope
}

/// Most likely tempo in BPM for `onset_envelope` sampled every `hop_size`
/// samples.
///
/// Each frame's windowed autocorrelation is normalized by its zero-lag value
/// and the frames are averaged; lags between 30 and 320 BPM are scored with
/// a log-normal prior around 120 BPM. Returns 0 when the envelope is flat
/// or too short to contain a valid lag.
pub(crate) fn estimate_tempo(onset_envelope: &[f32], sample_rate: u32, hop_size: usize) -> f32 {
    let frame_rate = sample_rate.max(1) as f32 / hop_size.max(1) as f32;
    let window = ((TEMPO_WINDOW_SECONDS * frame_rate).round() as usize).max(1);
    let lag_min = (60.0 * frame_rate / MAX_BPM).ceil().max(1.0) as usize;
    let lag_max = ((60.0 * frame_rate / MIN_BPM).floor() as usize).min(window.saturating_sub(1));
    if onset_envelope.is_empty() || lag_min > lag_max {
        return 0.0;
    }
    let Some(tempogram) = mean_tempogram(onset_envelope, window, lag_max) else {
        return 0.0;
    };

    let mut best: Option<(usize, f32)> = None;
    for lag in lag_min..=lag_max {
        let strength = tempogram[lag].max(0.0);
        let bpm = 60.0 * frame_rate / lag as f32;
        let prior = -0.5 * ((bpm.log2() - PRIOR_BPM.log2()) / PRIOR_OCTAVES).powi(2);
        let score = (1e6 * strength).ln_1p() + prior;
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((lag, score));
        }
    }
    best.map(|(lag, _)| 60.0 * frame_rate / lag as f32)
        .unwrap_or(0.0)
}

/// Frame-averaged, per-frame normalized local autocorrelation for lags
/// `0..=max_lag`. `None` when no frame carries any onset energy.
fn mean_tempogram(envelope: &[f32], window: usize, max_lag: usize) -> Option<Vec<f32>> {
    let mut autocorr = Autocorrelation::new(window);
    let taper = hann_window(window);
    let half = window / 2;
    let mut sum = vec![0.0_f64; max_lag + 1];
    let mut active = false;
    let mut segment = vec![0.0_f32; window];
    for center in 0..envelope.len() {
        for (i, cell) in segment.iter_mut().enumerate() {
            let position = (center + i).checked_sub(half);
            let value = position
                .and_then(|p| envelope.get(p))
                .copied()
                .unwrap_or(0.0);
            *cell = value * taper[i];
        }
        let lags = autocorr.compute(&segment);
        let peak = lags[0];
        if peak <= f32::EPSILON {
            continue;
        }
        active = true;
        for (acc, value) in sum.iter_mut().zip(&lags) {
            *acc += (*value / peak) as f64;
        }
    }
    if !active {
        return None;
    }
    let frames = envelope.len() as f64;
    Some(sum.into_iter().map(|v| (v / frames) as f32).collect())
}

/// FFT-based linear (non-circular) autocorrelation of fixed-length segments.
struct Autocorrelation {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex32>,
    scratch: Vec<Complex32>,
    len: usize,
}

impl Autocorrelation {
    fn new(len: usize) -> Self {
        let padded = (2 * len).next_power_of_two();
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(padded);
        let inverse = planner.plan_fft_inverse(padded);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            forward,
            inverse,
            buffer: vec![Complex32::default(); padded],
            scratch: vec![Complex32::default(); scratch_len],
            len,
        }
    }

    fn compute(&mut self, segment: &[f32]) -> Vec<f32> {
        for (i, cell) in self.buffer.iter_mut().enumerate() {
            let value = if i < self.len {
                segment.get(i).copied().unwrap_or(0.0)
            } else {
                0.0
            };
            *cell = Complex32::new(value, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        for cell in &mut self.buffer {
            *cell = Complex32::new(cell.norm_sqr(), 0.0);
        }
        self.inverse
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        let scale = 1.0 / self.buffer.len() as f32;
        self.buffer[..self.len]
            .iter()
            .map(|c| c.re * scale)
            .collect()
    }
}
