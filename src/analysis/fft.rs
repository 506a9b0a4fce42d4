use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex32};

/// Periodic Hann window, the usual analysis window for overlapping STFT frames.
pub(crate) fn hann_window(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![1.0_f32; length.max(1)];
    }
    let denom = length as f32;
    (0..length)
        .map(|n| 0.5_f32 * (1.0 - (2.0 * PI * n as f32 / denom).cos()))
        .collect()
}

/// Forward FFT of windowed real frames, reusing buffers across calls.
pub(crate) struct MagnitudePlan {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl MagnitudePlan {
    pub(crate) fn new(len: usize) -> Self {
        let len = len.max(1);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(len);
        let scratch = vec![Complex32::default(); fft.get_inplace_scratch_len()];
        Self {
            fft,
            window: hann_window(len),
            buffer: vec![Complex32::default(); len],
            scratch,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.window.len()
    }

    /// Window `frame` (zero-filled past its end) and return `|X[k]|` for
    /// bins `0..=len/2`.
    pub(crate) fn magnitudes(&mut self, frame: &[f32]) -> Vec<f32> {
        for (i, cell) in self.buffer.iter_mut().enumerate() {
            let sample = frame.get(i).copied().unwrap_or(0.0);
            *cell = Complex32::new(sample * self.window[i], 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        let bins = self.len() / 2 + 1;
        self.buffer[..bins].iter().map(|c| c.norm()).collect()
    }
}
