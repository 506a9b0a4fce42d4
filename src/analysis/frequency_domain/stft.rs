use crate::analysis::fft::MagnitudePlan;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SpectralFrame {
    pub(crate) centroid_hz: f32,
    pub(crate) rolloff_hz: f32,
    pub(crate) bandwidth_hz: f32,
}

const ROLLOFF_FRACTION: f64 = 0.85;

/// Magnitude spectra of centered, Hann-windowed frames.
///
/// The signal is zero-padded by `frame_size / 2` on both sides so frame `t`
/// is centered on sample `t * hop_size`.
pub(super) fn magnitude_frames(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Vec<Vec<f32>> {
    let frame_size = frame_size.max(1);
    let hop_size = hop_size.max(1);
    let pad = frame_size / 2;
    let frame_count = 1 + samples.len() / hop_size;
    let mut plan = MagnitudePlan::new(frame_size);
    let mut frame = vec![0.0_f32; frame_size];
    let mut out = Vec::with_capacity(frame_count);
    for index in 0..frame_count {
        fill_centered(&mut frame, samples, index * hop_size, pad);
        out.push(plan.magnitudes(&frame));
    }
    out
}

fn fill_centered(frame: &mut [f32], samples: &[f32], center: usize, pad: usize) {
    for (i, cell) in frame.iter_mut().enumerate() {
        let padded = center + i;
        *cell = if padded < pad {
            0.0
        } else {
            sanitize(samples.get(padded - pad).copied().unwrap_or(0.0))
        };
    }
}

fn sanitize(sample: f32) -> f32 {
    if sample.is_finite() { sample } else { 0.0 }
}

pub(super) fn spectral_frame(magnitudes: &[f32], sample_rate: u32, fft_len: usize) -> SpectralFrame {
    let (sum, centroid_hz) = centroid(magnitudes, sample_rate, fft_len);
    SpectralFrame {
        centroid_hz,
        rolloff_hz: rolloff(magnitudes, sample_rate, fft_len, sum),
        bandwidth_hz: bandwidth(magnitudes, sample_rate, fft_len, sum, centroid_hz),
    }
}

fn bin_hz(bin: usize, sample_rate: u32, fft_len: usize) -> f64 {
    bin as f64 * sample_rate.max(1) as f64 / fft_len.max(1) as f64
}

fn centroid(magnitudes: &[f32], sample_rate: u32, fft_len: usize) -> (f64, f32) {
    let mut sum = 0.0_f64;
    let mut sum_freq = 0.0_f64;
    for (bin, &m) in magnitudes.iter().enumerate() {
        let m = m.max(0.0) as f64;
        sum += m;
        sum_freq += m * bin_hz(bin, sample_rate, fft_len);
    }
    if sum <= 0.0 {
        return (0.0, 0.0);
    }
    (sum, (sum_freq / sum) as f32)
}

/// Lowest frequency below which 85% of the frame's magnitude lies.
fn rolloff(magnitudes: &[f32], sample_rate: u32, fft_len: usize, total: f64) -> f32 {
    if total <= 0.0 {
        return 0.0;
    }
    let target = total * ROLLOFF_FRACTION;
    let mut cum = 0.0_f64;
    for (bin, &m) in magnitudes.iter().enumerate() {
        cum += m.max(0.0) as f64;
        if cum >= target {
            return bin_hz(bin, sample_rate, fft_len) as f32;
        }
    }
    sample_rate as f32 * 0.5
}

/// Magnitude-weighted standard deviation around the centroid.
fn bandwidth(
    magnitudes: &[f32],
    sample_rate: u32,
    fft_len: usize,
    total: f64,
    centroid_hz: f32,
) -> f32 {
    if total <= 0.0 {
        return 0.0;
    }
    let centroid = centroid_hz as f64;
    let mut num = 0.0_f64;
    for (bin, &m) in magnitudes.iter().enumerate() {
        let diff = bin_hz(bin, sample_rate, fft_len) - centroid;
        num += diff * diff * m.max(0.0) as f64;
    }
    (num / total).sqrt() as f32
}
