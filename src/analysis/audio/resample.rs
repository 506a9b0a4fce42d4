use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::AudioDecodeError;
use crate::analysis::AudioSignal;

const CHUNK_FRAMES: usize = 1024;
const MAX_FLUSH_PASSES: usize = 16;

/// Sample-rate conversion seam used when a comparison pair disagrees on rate.
pub trait SignalResampler: Send + Sync {
    fn resample(
        &self,
        signal: &AudioSignal,
        target_rate: u32,
    ) -> Result<AudioSignal, AudioDecodeError>;
}

/// Band-limited windowed-sinc resampler backed by rubato.
#[derive(Debug, Clone, Copy, Default)]
pub struct SincResampler;

impl SignalResampler for SincResampler {
    fn resample(
        &self,
        signal: &AudioSignal,
        target_rate: u32,
    ) -> Result<AudioSignal, AudioDecodeError> {
        resample(signal, target_rate)
    }
}

/// A comparison pair sharing one sample rate.
#[derive(Debug, Clone)]
pub struct AlignedPair {
    pub first: AudioSignal,
    pub second: AudioSignal,
    /// Rate the second signal had before it was converted, if it was.
    pub second_original_rate: Option<u32>,
}

/// Bring `second` to the rate of `first`.
///
/// The first signal's rate is canonical: only the second one is ever
/// converted, and the resampler is not consulted when the rates already match.
pub fn align_sample_rates(
    first: AudioSignal,
    second: AudioSignal,
    resampler: &dyn SignalResampler,
) -> Result<AlignedPair, AudioDecodeError> {
    let target = first.sample_rate();
    let original = second.sample_rate();
    if original == target {
        return Ok(AlignedPair {
            first,
            second,
            second_original_rate: None,
        });
    }
    tracing::info!(
        "Sample rates differ: audio 1 = {target} Hz, audio 2 = {original} Hz; resampling audio 2 to {target} Hz"
    );
    let second = resampler.resample(&second, target)?;
    Ok(AlignedPair {
        first,
        second,
        second_original_rate: Some(original),
    })
}

/// Convert `signal` to `target_rate` with a windowed-sinc filter.
///
/// The output holds `round(len * target / source)` samples and is compensated
/// for the filter delay, so it stays time-aligned with the input.
pub fn resample(signal: &AudioSignal, target_rate: u32) -> Result<AudioSignal, AudioDecodeError> {
    let from = signal.sample_rate();
    let resample_error = |message: String| AudioDecodeError::Resample {
        from,
        to: target_rate,
        message,
    };
    if target_rate == 0 {
        return Err(resample_error("target rate must be non-zero".to_string()));
    }
    if target_rate == from {
        return Ok(signal.clone());
    }

    let ratio = target_rate as f64 / from as f64;
    let expected = (signal.sample_count() as f64 * ratio).round().max(1.0) as usize;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, 1)
        .map_err(|err| resample_error(err.to_string()))?;

    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + CHUNK_FRAMES);
    let mut chunks = signal.samples().chunks_exact(CHUNK_FRAMES);
    for chunk in chunks.by_ref() {
        let frames = resampler
            .process(&[chunk][..], None)
            .map_err(|err| resample_error(err.to_string()))?;
        output.extend_from_slice(&frames[0]);
    }
    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let frames = resampler
            .process_partial(Some(&[remainder][..]), None)
            .map_err(|err| resample_error(err.to_string()))?;
        output.extend_from_slice(&frames[0]);
    }
    let mut passes = 0usize;
    while output.len() < expected + delay && passes < MAX_FLUSH_PASSES {
        let frames = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|err| resample_error(err.to_string()))?;
        output.extend_from_slice(&frames[0]);
        passes += 1;
    }

    let mut samples: Vec<f32> = output.into_iter().skip(delay).take(expected).collect();
    samples.resize(expected, 0.0);
    tracing::debug!(
        "Resampled {} samples at {from} Hz into {} samples at {target_rate} Hz",
        signal.sample_count(),
        samples.len()
    );
    AudioSignal::new(samples, target_rate).map_err(|err| resample_error(err.to_string()))
}
