use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use tracing::{error, info, warn};

use super::images::render_all;
use super::session::SessionDir;
use super::{
    ComparisonError, ComparisonReport, DiagnosticImages, PreparedComparison, SignalSummary,
};
use crate::analysis::audio::{self, SignalResampler, SincResampler, align_sample_rates};
use crate::analysis::{AudioSignal, Extraction, FeatureExtractionError, extract};
use crate::config::AppSettings;
use crate::reasoning::prompt::{
    ANALYSIS_SYSTEM_PROMPT, IMPROVEMENT_SYSTEM_PROMPT, analysis_prompt, improvement_prompt,
};
use crate::reasoning::{ReasoningService, UpstreamServiceError};

/// Runs comparisons of two audio files into fresh session directories.
///
/// Holds no per-comparison state, so one comparator can serve concurrent
/// comparisons from several threads.
#[derive(Clone)]
pub struct Comparator {
    output_root: PathBuf,
    resampler: Arc<dyn SignalResampler>,
}

impl Comparator {
    pub fn new(settings: &AppSettings, resampler: Arc<dyn SignalResampler>) -> Self {
        Self {
            output_root: settings.output_root.clone(),
            resampler,
        }
    }

    /// Comparator using the windowed-sinc resampler.
    pub fn with_default_resampler(settings: &AppSettings) -> Self {
        Self::new(settings, Arc::new(SincResampler))
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Load, align, extract and render; stops short of the reasoning calls.
    pub fn prepare(
        &self,
        first: &Path,
        second: &Path,
    ) -> Result<PreparedComparison, ComparisonError> {
        let signal1 = load(first)?;
        let signal2 = load(second)?;
        let aligned =
            align_sample_rates(signal1, signal2, self.resampler.as_ref()).map_err(|source| {
                error!("Resampling {} failed: {source}", second.display());
                ComparisonError::Resample {
                    path: second.to_path_buf(),
                    source,
                }
            })?;

        let (features1, features2) = extract_pair(&aligned.first, &aligned.second);

        let session = SessionDir::create(&self.output_root).map_err(|source| {
            error!(
                "Creating session directory under {} failed: {source}",
                self.output_root.display()
            );
            ComparisonError::Session {
                root: self.output_root.clone(),
                source,
            }
        })?;
        let images = render_session(&aligned.first, &aligned.second, &session)?;

        let audio1 = SignalSummary::new(first, &aligned.first, None);
        let audio2 = SignalSummary::new(second, &aligned.second, aligned.second_original_rate);
        let analysis_prompt = analysis_prompt(
            audio1.duration_seconds,
            audio2.duration_seconds,
            &features1,
            &features2,
        );
        Ok(PreparedComparison {
            audio1,
            audio2,
            features1,
            features2,
            images,
            session,
            analysis_prompt,
        })
    }

    /// Full comparison: [`Comparator::prepare`] followed by both reasoning calls.
    pub fn compare(
        &self,
        first: &Path,
        second: &Path,
        reasoning: &dyn ReasoningService,
    ) -> Result<ComparisonReport, ComparisonError> {
        self.prepare(first, second)?.finish(reasoning)
    }
}

impl std::fmt::Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comparator")
            .field("output_root", &self.output_root)
            .finish_non_exhaustive()
    }
}

impl PreparedComparison {
    /// Ask for the similarity verdict, then for suggestions built on it.
    ///
    /// On failure the session directory and its images are left in place.
    pub fn finish(
        self,
        reasoning: &dyn ReasoningService,
    ) -> Result<ComparisonReport, ComparisonError> {
        let upstream = |source: UpstreamServiceError| {
            error!(
                "Reasoning request failed: {source}; images kept in {}",
                self.session.path().display()
            );
            ComparisonError::Upstream {
                session_dir: self.session.path().to_path_buf(),
                source,
            }
        };
        info!("Requesting similarity analysis");
        let analysis = reasoning
            .complete(ANALYSIS_SYSTEM_PROMPT, &self.analysis_prompt)
            .map_err(upstream)?;
        info!("Requesting improvement suggestions");
        let suggestion = reasoning
            .complete(IMPROVEMENT_SYSTEM_PROMPT, &improvement_prompt(&analysis))
            .map_err(upstream)?;
        Ok(ComparisonReport {
            prepared: self,
            analysis,
            suggestion,
        })
    }
}

/// Render into `session`, deleting the directory again when any image fails
/// so a render error never leaves a half-filled session behind.
fn render_session(
    first: &AudioSignal,
    second: &AudioSignal,
    session: &SessionDir,
) -> Result<DiagnosticImages, ComparisonError> {
    info!("Writing diagnostic images to {}", session.path().display());
    render_all(first, second, session).map_err(|source| {
        error!("Rendering failed: {source}");
        if let Err(err) = session.clone().remove() {
            warn!(
                "Failed to remove session directory {}: {err}",
                session.path().display()
            );
        }
        ComparisonError::from(source)
    })
}

fn load(path: &Path) -> Result<AudioSignal, ComparisonError> {
    audio::load(path).map_err(|source| {
        error!("Loading {} failed: {source}", path.display());
        ComparisonError::Load {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Extract both feature sets on scoped threads; a panic on either side
/// becomes [`FeatureExtractionError::Panicked`] for that side only.
fn extract_pair(first: &AudioSignal, second: &AudioSignal) -> (Extraction, Extraction) {
    thread::scope(|scope| {
        let handle1 = scope.spawn(|| extract(first));
        let handle2 = scope.spawn(|| extract(second));
        (join_extraction(handle1, 1), join_extraction(handle2, 2))
    })
}

fn join_extraction(handle: thread::ScopedJoinHandle<'_, Extraction>, index: usize) -> Extraction {
    handle.join().unwrap_or_else(|_| {
        warn!("Feature extraction for audio {index} panicked");
        Extraction::Failed(FeatureExtractionError::Panicked)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct ScriptedReasoning {
        answers: Mutex<Vec<Result<String, UpstreamServiceError>>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedReasoning {
        fn new(answers: Vec<Result<String, UpstreamServiceError>>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ReasoningService for ScriptedReasoning {
        fn complete(&self, system: &str, user: &str) -> Result<String, UpstreamServiceError> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            self.answers
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(UpstreamServiceError::EmptyCompletion))
        }
    }

    fn write_tone(path: &Path, seconds: f32, rate: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let count = (seconds * rate as f32) as usize;
        for i in 0..count {
            let t = i as f32 / rate as f32;
            let sample = (t * 330.0 * std::f32::consts::TAU).sin() * 0.4;
            writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn comparator(root: &Path) -> Comparator {
        let settings = AppSettings {
            output_root: root.to_path_buf(),
            ..AppSettings::default()
        };
        Comparator::with_default_resampler(&settings)
    }

    #[test]
    fn finish_sends_improvement_prompt_built_on_analysis() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.wav");
        let second = dir.path().join("b.wav");
        write_tone(&first, 0.5, 8_000);
        write_tone(&second, 0.5, 8_000);
        let reasoning = ScriptedReasoning::new(vec![Ok("相似度 90%".into()), Ok("保持".into())]);

        let report = comparator(&dir.path().join("out"))
            .compare(&first, &second, &reasoning)
            .unwrap();
        assert_eq!(report.analysis, "相似度 90%");
        assert_eq!(report.suggestion, "保持");

        let calls = reasoning.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, ANALYSIS_SYSTEM_PROMPT);
        assert_eq!(calls[0].1, report.prepared.analysis_prompt);
        assert_eq!(calls[1].0, IMPROVEMENT_SYSTEM_PROMPT);
        assert_eq!(calls[1].1, improvement_prompt("相似度 90%"));
    }

    #[test]
    fn failed_first_call_skips_second_and_keeps_images() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.wav");
        write_tone(&first, 0.5, 8_000);
        let reasoning = ScriptedReasoning::new(vec![Err(UpstreamServiceError::Transport(
            "connection refused".into(),
        ))]);

        let err = comparator(&dir.path().join("out"))
            .compare(&first, &first, &reasoning)
            .unwrap_err();
        assert!(err.is_upstream());
        let session_dir = err.session_dir().unwrap();
        assert!(session_dir.join(super::super::SPECTROGRAM_COMPARISON).is_file());
        assert_eq!(reasoning.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn render_failure_removes_session_directory() {
        let dir = tempdir().unwrap();
        let session = SessionDir::create(&dir.path().join("out")).unwrap();
        // A directory squatting on a later image name makes its final rename fail.
        std::fs::create_dir(session.join(super::super::CHROMAGRAM_AUDIO1)).unwrap();
        let tone: Vec<f32> = (0..4_000)
            .map(|i| (i as f32 * 330.0 * std::f32::consts::TAU / 8_000.0).sin() * 0.4)
            .collect();
        let signal = AudioSignal::new(tone, 8_000).unwrap();

        let err = render_session(&signal, &signal, &session).unwrap_err();
        assert_eq!(err.stage(), super::super::ComparisonStage::Render);
        assert!(err.to_string().contains(super::super::CHROMAGRAM_AUDIO1));
        assert!(err.session_dir().is_none());
        assert!(!session.path().exists());
    }

    #[test]
    fn missing_file_fails_at_load_without_session() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let err = comparator(&out)
            .prepare(&dir.path().join("nope.wav"), &dir.path().join("nope.wav"))
            .unwrap_err();
        assert_eq!(err.stage(), super::super::ComparisonStage::Load);
        assert!(!out.exists());
    }
}
