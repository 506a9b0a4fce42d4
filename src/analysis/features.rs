use std::fmt;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use thiserror::Error;

use super::AudioSignal;
use super::frequency_domain::{
    CONTRAST_VALUES, MFCC_COUNT, PITCH_CLASS_COUNT, STFT_FRAME_SIZE, STFT_HOP_SIZE, Spectrogram,
    mfcc_frames, stats,
};
use super::{tempo, time_domain};

/// Decimal places used when features are rendered as text.
const RENDER_PRECISION: usize = 4;

/// Clip-level acoustic descriptors, each averaged over all STFT frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub mfcc_mean: [f32; MFCC_COUNT],
    pub chroma_mean: [f32; PITCH_CLASS_COUNT],
    pub spectral_contrast_mean: [f32; CONTRAST_VALUES],
    pub spectral_rolloff_mean: [f32; 1],
    pub zero_crossing_rate_mean: f32,
    pub rms_energy_mean: f32,
    pub spectral_bandwidth_mean: f32,
    pub spectral_centroid_mean: f32,
    /// Estimated tempo in BPM, 0 when no pulse is found.
    pub tempo: f32,
}

impl FeatureVector {
    /// Name of the first non-finite field, if any.
    fn first_non_finite(&self) -> Option<&'static str> {
        let groups: [(&'static str, &[f32]); 9] = [
            ("mfcc_mean", &self.mfcc_mean),
            ("chroma_mean", &self.chroma_mean),
            ("spectral_contrast_mean", &self.spectral_contrast_mean),
            ("spectral_rolloff_mean", &self.spectral_rolloff_mean),
            (
                "zero_crossing_rate_mean",
                std::slice::from_ref(&self.zero_crossing_rate_mean),
            ),
            ("rms_energy_mean", std::slice::from_ref(&self.rms_energy_mean)),
            (
                "spectral_bandwidth_mean",
                std::slice::from_ref(&self.spectral_bandwidth_mean),
            ),
            (
                "spectral_centroid_mean",
                std::slice::from_ref(&self.spectral_centroid_mean),
            ),
            ("tempo", std::slice::from_ref(&self.tempo)),
        ];
        groups
            .into_iter()
            .find(|(_, values)| values.iter().any(|v| !v.is_finite()))
            .map(|(name, _)| name)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[f32]) -> fmt::Result {
    f.write_str("[")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value:.p$}", p = RENDER_PRECISION)?;
    }
    f.write_str("]")
}

impl fmt::Display for FeatureVector {
    /// A mapping of the nine descriptors in declaration order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{\"mfcc_mean\": ")?;
        write_list(f, &self.mfcc_mean)?;
        f.write_str(", \"chroma_mean\": ")?;
        write_list(f, &self.chroma_mean)?;
        f.write_str(", \"spectral_contrast_mean\": ")?;
        write_list(f, &self.spectral_contrast_mean)?;
        f.write_str(", \"spectral_rolloff_mean\": ")?;
        write_list(f, &self.spectral_rolloff_mean)?;
        write!(
            f,
            ", \"zero_crossing_rate_mean\": {:.p$}, \"rms_energy_mean\": {:.p$}, \
             \"spectral_bandwidth_mean\": {:.p$}, \"spectral_centroid_mean\": {:.p$}, \
             \"tempo\": {:.p$}}}",
            self.zero_crossing_rate_mean,
            self.rms_energy_mean,
            self.spectral_bandwidth_mean,
            self.spectral_centroid_mean,
            self.tempo,
            p = RENDER_PRECISION
        )
    }
}

/// Why a signal produced no feature vector.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeatureExtractionError {
    /// The input signal carries NaN or infinity.
    #[error("non-finite sample at index {index}")]
    NonFiniteSample { index: usize },
    /// A computed feature came out NaN or infinite.
    #[error("feature {name} is not finite")]
    NonFiniteFeature { name: &'static str },
    /// The extraction thread panicked.
    #[error("feature extraction panicked")]
    Panicked,
}

/// Outcome of [`extract`]: a complete vector or the reason there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Extracted(FeatureVector),
    Failed(FeatureExtractionError),
}

impl Extraction {
    pub fn features(&self) -> Option<&FeatureVector> {
        match self {
            Extraction::Extracted(features) => Some(features),
            Extraction::Failed(_) => None,
        }
    }

    pub fn is_extracted(&self) -> bool {
        matches!(self, Extraction::Extracted(_))
    }
}

impl fmt::Display for Extraction {
    /// Failed extractions render as an empty mapping.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extraction::Extracted(features) => fmt::Display::fmt(features, f),
            Extraction::Failed(_) => f.write_str("{}"),
        }
    }
}

impl Serialize for Extraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Extraction::Extracted(features) => features.serialize(serializer),
            Extraction::Failed(reason) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", &reason.to_string())?;
                map.end()
            }
        }
    }
}

/// Compute the full descriptor set for `signal`.
///
/// Deterministic; returns [`Extraction::Failed`] rather than a partial vector.
pub fn extract(signal: &AudioSignal) -> Extraction {
    match try_extract(signal) {
        Ok(features) => Extraction::Extracted(features),
        Err(err) => {
            tracing::warn!("Feature extraction failed: {err}");
            Extraction::Failed(err)
        }
    }
}

fn try_extract(signal: &AudioSignal) -> Result<FeatureVector, FeatureExtractionError> {
    let samples = signal.samples();
    if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
        return Err(FeatureExtractionError::NonFiniteSample { index });
    }
    let sample_rate = signal.sample_rate();

    let spectrogram = Spectrogram::compute(signal);
    let spectral = spectrogram.spectral_frames();
    let mel_db = spectrogram.mel_db_frames();
    let onsets = tempo::onset_strength(&mel_db);

    let features = FeatureVector {
        mfcc_mean: stats::mean_arrays(&mfcc_frames(&mel_db)),
        chroma_mean: stats::mean_arrays(&spectrogram.chroma_frames()),
        spectral_contrast_mean: stats::mean_arrays(&spectrogram.contrast_frames()),
        spectral_rolloff_mean: [stats::mean_of(&spectral, |f| f.rolloff_hz)],
        zero_crossing_rate_mean: stats::mean(&time_domain::zero_crossing_rates(
            samples,
            STFT_FRAME_SIZE,
            STFT_HOP_SIZE,
        )),
        rms_energy_mean: stats::mean(&time_domain::rms_frames(
            samples,
            STFT_FRAME_SIZE,
            STFT_HOP_SIZE,
        )),
        spectral_bandwidth_mean: stats::mean_of(&spectral, |f| f.bandwidth_hz),
        spectral_centroid_mean: stats::mean_of(&spectral, |f| f.centroid_hz),
        tempo: tempo::estimate_tempo(&onsets, sample_rate, STFT_HOP_SIZE),
    };
    if let Some(name) = features.first_non_finite() {
        return Err(FeatureExtractionError::NonFiniteFeature { name });
    }
    tracing::debug!(
        "Extracted features from {} frames ({} Hz, tempo {:.1} BPM)",
        spectrogram.frame_count(),
        sample_rate,
        features.tempo
    );
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, sample_rate: u32, seconds: f32) -> AudioSignal {
        let len = (sample_rate as f32 * seconds) as usize;
        let samples = (0..len)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        AudioSignal::new(samples, sample_rate).unwrap()
    }

    #[test]
    fn silence_has_no_energy_crossings_or_tempo() {
        let signal = AudioSignal::new(vec![0.0; 22_050], 22_050).unwrap();
        let features = extract(&signal).features().cloned().unwrap();
        assert!(features.rms_energy_mean.abs() < 1e-6);
        assert!(features.zero_crossing_rate_mean.abs() < 1e-6);
        assert_eq!(features.tempo, 0.0);
        assert_eq!(features.spectral_centroid_mean, 0.0);
    }

    #[test]
    fn tone_features_reflect_pitch_and_level() {
        let features = extract(&tone(440.0, 22_050, 1.0)).features().cloned().unwrap();
        // A4 dominates the chroma profile.
        let loudest = features
            .chroma_mean
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap();
        assert_eq!(loudest, 9);
        assert!(features.spectral_centroid_mean > 350.0 && features.spectral_centroid_mean < 550.0);
        // Interior frames of a 0.5 amplitude sine sit near 0.354 RMS.
        assert!(features.rms_energy_mean > 0.3 && features.rms_energy_mean < 0.36);
        let expected_zcr = 2.0 * 440.0 / 22_050.0;
        assert!((features.zero_crossing_rate_mean - expected_zcr).abs() < 0.01);
    }

    #[test]
    fn extraction_is_deterministic() {
        let signal = tone(330.0, 16_000, 0.7);
        assert_eq!(extract(&signal), extract(&signal));
    }

    #[test]
    fn non_finite_samples_fail_without_partial_vector() {
        let signal = AudioSignal::new(vec![0.0, f32::NAN, 0.1], 8_000).unwrap();
        assert_eq!(
            extract(&signal),
            Extraction::Failed(FeatureExtractionError::NonFiniteSample { index: 1 })
        );
    }

    #[test]
    fn failed_extraction_renders_as_empty_mapping() {
        let failed = Extraction::Failed(FeatureExtractionError::Panicked);
        assert_eq!(failed.to_string(), "{}");
        assert!(!failed.is_extracted());
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"], "feature extraction panicked");
    }

    #[test]
    fn rendering_lists_nine_keys_in_order() {
        let features = extract(&tone(220.0, 16_000, 0.5)).features().cloned().unwrap();
        let text = features.to_string();
        let keys = [
            "mfcc_mean",
            "chroma_mean",
            "spectral_contrast_mean",
            "spectral_rolloff_mean",
            "zero_crossing_rate_mean",
            "rms_energy_mean",
            "spectral_bandwidth_mean",
            "spectral_centroid_mean",
            "tempo",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|key| text.find(&format!("\"{key}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(text.starts_with('{') && text.ends_with('}'));
        // Parses as a JSON object with exactly nine entries.
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_object().unwrap().len(), 9);
        assert_eq!(parsed["mfcc_mean"].as_array().unwrap().len(), MFCC_COUNT);
    }
}
