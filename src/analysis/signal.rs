use thiserror::Error;

/// Mono audio samples at a fixed sampling rate.
///
/// A signal always holds at least one sample and a non-zero rate; the
/// constructor refuses anything else. Samples are read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// Reasons a sample buffer cannot become an [`AudioSignal`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidSignal {
    /// The buffer is empty.
    #[error("signal has no samples")]
    Empty,
    /// The sample rate is zero.
    #[error("sample rate must be non-zero")]
    ZeroSampleRate,
}

impl AudioSignal {
    /// Wrap mono samples recorded at `sample_rate` Hz.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, InvalidSignal> {
        if sample_rate == 0 {
            return Err(InvalidSignal::ZeroSampleRate);
        }
        if samples.is_empty() {
            return Err(InvalidSignal::Empty);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Length of the signal in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
