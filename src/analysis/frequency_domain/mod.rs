//! Frequency-domain analysis: one STFT framing shared by every spectral
//! descriptor (centroid, roll-off, bandwidth, contrast, chroma, MFCC).

mod chroma;
mod contrast;
mod mel;
pub(crate) mod stats;
mod stft;

use crate::analysis::AudioSignal;

pub use chroma::{PITCH_CLASS_COUNT, PITCH_CLASS_NAMES};
pub use contrast::CONTRAST_VALUES;
pub use mel::MFCC_COUNT;
pub(crate) use stft::SpectralFrame;

/// Samples per STFT frame.
pub const STFT_FRAME_SIZE: usize = 2048;
/// Samples between consecutive STFT frames.
pub const STFT_HOP_SIZE: usize = 512;

const MEL_BANDS: usize = 128;

/// Magnitude spectrogram of a signal with centered frames.
///
/// Frame `t` is centered on sample `t * hop`; the signal is zero-padded by
/// half a frame on both ends, giving `1 + len / hop` frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    frames: Vec<Vec<f32>>,
}

impl Spectrogram {
    /// Spectrogram with the crate-wide framing.
    pub fn compute(signal: &AudioSignal) -> Self {
        Self::with_framing(
            signal.samples(),
            signal.sample_rate(),
            STFT_FRAME_SIZE,
            STFT_HOP_SIZE,
        )
    }

    pub fn with_framing(
        samples: &[f32],
        sample_rate: u32,
        frame_size: usize,
        hop_size: usize,
    ) -> Self {
        let frame_size = frame_size.max(2);
        let hop_size = hop_size.max(1);
        Self {
            sample_rate: sample_rate.max(1),
            frame_size,
            hop_size,
            frames: stft::magnitude_frames(samples, frame_size, hop_size),
        }
    }

    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn bin_count(&self) -> usize {
        self.frame_size / 2 + 1
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Center frequency of FFT bin `bin` in Hz.
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.frame_size as f32
    }

    /// Time of frame `frame`'s center in seconds.
    pub fn frame_time(&self, frame: usize) -> f32 {
        (frame * self.hop_size) as f32 / self.sample_rate as f32
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 * 0.5
    }

    /// Per-frame centroid, roll-off and bandwidth.
    pub(crate) fn spectral_frames(&self) -> Vec<SpectralFrame> {
        self.frames
            .iter()
            .map(|frame| stft::spectral_frame(frame, self.sample_rate, self.frame_size))
            .collect()
    }

    /// Spectral centroid (Hz) for every frame.
    pub fn spectral_centroids(&self) -> Vec<f32> {
        self.spectral_frames()
            .into_iter()
            .map(|frame| frame.centroid_hz)
            .collect()
    }

    /// Per-frame pitch-class energy, each frame scaled so its loudest class is 1.
    pub fn chroma_frames(&self) -> Vec<[f32; PITCH_CLASS_COUNT]> {
        let bank = chroma::ChromaBank::new(self.sample_rate, self.frame_size);
        self.frames
            .iter()
            .map(|frame| bank.chroma_from_magnitudes(frame))
            .collect()
    }

    /// Per-frame octave-band spectral contrast in dB.
    pub(crate) fn contrast_frames(&self) -> Vec<[f32; CONTRAST_VALUES]> {
        let bands = contrast::ContrastBands::new(self.sample_rate, self.frame_size);
        self.frames
            .iter()
            .map(|frame| bands.contrast(frame))
            .collect()
    }

    /// Mel power spectrogram in dB, limited to 80 dB below its peak.
    pub(crate) fn mel_db_frames(&self) -> Vec<Vec<f32>> {
        let bank = mel::MelBank::new(
            self.sample_rate,
            self.frame_size,
            MEL_BANDS,
            0.0,
            self.nyquist(),
        );
        let mut mel_frames: Vec<Vec<f32>> = self
            .frames
            .iter()
            .map(|frame| {
                let power: Vec<f32> = frame.iter().map(|m| m * m).collect();
                bank.apply(&power)
            })
            .collect();
        mel::power_to_db_in_place(&mut mel_frames, mel::TOP_DB);
        mel_frames
    }

    /// Magnitudes in dB relative to this spectrogram's own peak, floored at
    /// `-floor_db`.
    pub fn decibels_relative_to_peak(&self, floor_db: f32) -> Vec<Vec<f32>> {
        let peak = self
            .frames
            .iter()
            .flat_map(|frame| frame.iter().copied())
            .fold(0.0_f32, f32::max);
        let floor = -floor_db.abs();
        self.frames
            .iter()
            .map(|frame| {
                frame
                    .iter()
                    .map(|&mag| {
                        if peak <= 0.0 {
                            return floor;
                        }
                        let db = 20.0 * (mag.max(AMPLITUDE_FLOOR) / peak).log10();
                        db.max(floor)
                    })
                    .collect()
            })
            .collect()
    }
}

const AMPLITUDE_FLOOR: f32 = 1e-5;

/// MFCCs for each frame of a mel dB spectrogram.
pub(crate) fn mfcc_frames(mel_db: &[Vec<f32>]) -> Vec<[f32; MFCC_COUNT]> {
    mel_db.iter().map(|frame| mel::mfcc_from_db(frame)).collect()
}
