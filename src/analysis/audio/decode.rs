use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};
use thiserror::Error;

use super::downmix::downmix_to_mono;
use crate::analysis::{AudioSignal, InvalidSignal};

/// Failures while turning a file (or a resampling request) into a signal.
#[derive(Debug, Error)]
pub enum AudioDecodeError {
    /// The file could not be opened.
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    /// No container or codec recognised the file.
    #[error("Unsupported or corrupt audio in {path}: {source}")]
    Probe {
        path: PathBuf,
        source: SymphoniaError,
    },
    /// The container holds no default track.
    #[error("No decodable audio track in {path}")]
    NoTrack { path: PathBuf },
    /// The track does not declare a usable sample rate.
    #[error("Missing sample rate for {path}")]
    MissingSampleRate { path: PathBuf },
    /// Reading or decoding a packet failed.
    #[error("Decode failed for {path}: {source}")]
    Decode {
        path: PathBuf,
        source: SymphoniaError,
    },
    /// Decoding finished but produced no usable signal.
    #[error("Decoded audio from {path} is unusable: {source}")]
    Invalid {
        path: PathBuf,
        source: InvalidSignal,
    },
    /// The resampler rejected the conversion.
    #[error("Resampling {from} Hz to {to} Hz failed: {message}")]
    Resample { from: u32, to: u32, message: String },
}

/// Decode `path` at its native sample rate and mix it down to mono.
pub fn load(path: &Path) -> Result<AudioSignal, AudioDecodeError> {
    tracing::info!("Loading audio file {}", path.display());
    let (samples, sample_rate) = decode_mono(path)?;
    let signal = AudioSignal::new(samples, sample_rate).map_err(|source| {
        AudioDecodeError::Invalid {
            path: path.to_path_buf(),
            source,
        }
    })?;
    tracing::debug!(
        "Decoded {} at {} Hz ({:.2}s)",
        path.display(),
        signal.sample_rate(),
        signal.duration_seconds()
    );
    Ok(signal)
}

fn decode_mono(path: &Path) -> Result<(Vec<f32>, u32), AudioDecodeError> {
    let file = File::open(path).map_err(|source| AudioDecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|source| AudioDecodeError::Probe {
            path: path.to_path_buf(),
            source,
        })?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AudioDecodeError::NoTrack {
            path: path.to_path_buf(),
        })?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| AudioDecodeError::MissingSampleRate {
            path: path.to_path_buf(),
        })?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|source| AudioDecodeError::Probe {
            path: path.to_path_buf(),
            source,
        })?;

    let mut mono = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break,
            Err(source) => {
                return Err(AudioDecodeError::Decode {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if packet.track_id() != track_id {
            continue;
        }
        let audio_buf = match decoder.decode(&packet) {
            Ok(audio_buf) => audio_buf,
            Err(SymphoniaError::DecodeError(message)) => {
                tracing::warn!("Skipping corrupt packet in {}: {message}", path.display());
                continue;
            }
            Err(source) => {
                return Err(AudioDecodeError::Decode {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let spec = *audio_buf.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        downmix_to_mono(&mut mono, sample_buf.samples(), spec.channels.count());
    }

    Ok((mono, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::TempDir;

    #[test]
    fn stereo_wav_loads_as_mono_at_native_rate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..(44_100 / 10) {
            writer.write_sample::<f32>(0.5).unwrap();
            writer.write_sample::<f32>(0.0).unwrap();
        }
        writer.finalize().unwrap();

        let signal = load(&path).unwrap();
        assert_eq!(signal.sample_rate(), 44_100);
        assert_eq!(signal.sample_count(), 4_410);
        assert!(signal.samples().iter().all(|s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn integer_wav_is_scaled_to_unit_range() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("int.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..1_600 {
            writer.write_sample::<i16>(i16::MAX / 2).unwrap();
        }
        writer.finalize().unwrap();

        let signal = load(&path).unwrap();
        assert_eq!(signal.sample_rate(), 16_000);
        assert!((signal.samples()[100] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn float_wav_above_full_scale_is_not_clipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hot.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..8_000 {
            let t = i as f32 / 8_000.0;
            writer
                .write_sample::<f32>((t * 200.0 * std::f32::consts::TAU).sin() * 2.0)
                .unwrap();
        }
        writer.finalize().unwrap();

        let signal = load(&path).unwrap();
        let peak = signal.samples().iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 1.9, "peak {peak}");
    }

    #[test]
    fn missing_file_reports_open_error() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("missing.wav")).unwrap_err();
        assert!(matches!(err, AudioDecodeError::Open { .. }));
    }

    #[test]
    fn garbage_bytes_report_probe_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, AudioDecodeError::Probe { .. }));
        assert!(err.to_string().contains("noise.wav"));
    }
}
