use std::path::{Path, PathBuf};

use serde::Serialize;

use super::session::SessionDir;
use crate::analysis::AudioSignal;
use crate::render::{
    RenderError, plot_chromagram, plot_spectral_centroid, plot_spectrogram_comparison,
    plot_waveform,
};

pub const WAVEFORM_AUDIO1: &str = "waveform_audio1.png";
pub const WAVEFORM_AUDIO2: &str = "waveform_audio2.png";
pub const SPECTRAL_CENTROID_AUDIO1: &str = "spectral_centroid_audio1.png";
pub const SPECTRAL_CENTROID_AUDIO2: &str = "spectral_centroid_audio2.png";
pub const CHROMAGRAM_AUDIO1: &str = "chromagram_audio1.png";
pub const CHROMAGRAM_AUDIO2: &str = "chromagram_audio2.png";
pub const SPECTROGRAM_COMPARISON: &str = "spectrogram_comparison.png";

/// Paths of the seven images written for one comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticImages {
    pub waveform_audio1: PathBuf,
    pub waveform_audio2: PathBuf,
    pub spectral_centroid_audio1: PathBuf,
    pub spectral_centroid_audio2: PathBuf,
    pub chromagram_audio1: PathBuf,
    pub chromagram_audio2: PathBuf,
    pub spectrogram_comparison: PathBuf,
}

impl DiagnosticImages {
    /// Display label and path of every image, in presentation order.
    pub fn labeled(&self) -> [(&'static str, &Path); 7] {
        [
            ("波形图 - Audio 1", self.waveform_audio1.as_path()),
            ("波形图 - Audio 2", self.waveform_audio2.as_path()),
            ("频谱质心图 - Audio 1", self.spectral_centroid_audio1.as_path()),
            ("频谱质心图 - Audio 2", self.spectral_centroid_audio2.as_path()),
            ("色度图 - Audio 1", self.chromagram_audio1.as_path()),
            ("色度图 - Audio 2", self.chromagram_audio2.as_path()),
            ("声谱对比图", self.spectrogram_comparison.as_path()),
        ]
    }

    pub fn paths(&self) -> [&Path; 7] {
        self.labeled().map(|(_, path)| path)
    }
}

/// Render every diagnostic image for the pair into `session`.
pub(super) fn render_all(
    first: &AudioSignal,
    second: &AudioSignal,
    session: &SessionDir,
) -> Result<DiagnosticImages, RenderError> {
    Ok(DiagnosticImages {
        waveform_audio1: plot_waveform(
            first,
            "Waveform of Audio 1",
            &session.join(WAVEFORM_AUDIO1),
        )?,
        waveform_audio2: plot_waveform(
            second,
            "Waveform of Audio 2",
            &session.join(WAVEFORM_AUDIO2),
        )?,
        spectral_centroid_audio1: plot_spectral_centroid(
            first,
            "Spectral Centroid of Audio 1",
            &session.join(SPECTRAL_CENTROID_AUDIO1),
        )?,
        spectral_centroid_audio2: plot_spectral_centroid(
            second,
            "Spectral Centroid of Audio 2",
            &session.join(SPECTRAL_CENTROID_AUDIO2),
        )?,
        chromagram_audio1: plot_chromagram(
            first,
            "Chromagram of Audio 1",
            &session.join(CHROMAGRAM_AUDIO1),
        )?,
        chromagram_audio2: plot_chromagram(
            second,
            "Chromagram of Audio 2",
            &session.join(CHROMAGRAM_AUDIO2),
        )?,
        spectrogram_comparison: plot_spectrogram_comparison(
            first,
            second,
            "Spectrogram Comparison",
            &session.join(SPECTROGRAM_COMPARISON),
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn renders_seven_distinct_files_into_session() {
        let base = tempdir().unwrap();
        let session = SessionDir::create(base.path()).unwrap();
        let tone: Vec<f32> = (0..8_000)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / 8_000.0).sin() * 0.5)
            .collect();
        let first = AudioSignal::new(tone.clone(), 8_000).unwrap();
        let second = AudioSignal::new(tone[..4_000].to_vec(), 8_000).unwrap();

        let images = render_all(&first, &second, &session).unwrap();
        let paths = images.paths();
        for path in paths {
            assert!(path.is_file(), "missing {}", path.display());
            assert_eq!(path.parent(), Some(session.path()));
        }
        let mut names: Vec<_> = paths.iter().map(|p| p.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
    }
}
