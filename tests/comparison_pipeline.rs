//! End-to-end comparisons over WAV fixtures written to scratch directories.

mod support;

use std::collections::HashSet;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use support::{config_env::ConfigHomeGuard, wav::write_tone_wav, wav::write_test_wav};
use tempfile::tempdir;
use timbrelab::analysis::audio::{AudioDecodeError, SignalResampler, SincResampler};
use timbrelab::reasoning::prompt::{ANALYSIS_SYSTEM_PROMPT, IMPROVEMENT_SYSTEM_PROMPT};
use timbrelab::report::ComparisonStage;
use timbrelab::{
    AppSettings, AudioSignal, ChatCompletionsClient, Comparator, ReasoningConfig,
    ReasoningService, UpstreamServiceError,
};

#[derive(Default)]
struct SpyResampler {
    calls: AtomicUsize,
}

impl SignalResampler for SpyResampler {
    fn resample(
        &self,
        signal: &AudioSignal,
        target_rate: u32,
    ) -> Result<AudioSignal, AudioDecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SincResampler.resample(signal, target_rate)
    }
}

#[derive(Default)]
struct RecordingReasoning {
    prompts: Mutex<Vec<(String, String)>>,
}

impl ReasoningService for RecordingReasoning {
    fn complete(&self, system: &str, user: &str) -> Result<String, UpstreamServiceError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push((system.to_string(), user.to_string()));
        Ok(format!("answer {}", prompts.len()))
    }
}

fn settings(root: &Path) -> AppSettings {
    AppSettings {
        output_root: root.to_path_buf(),
        ..AppSettings::default()
    }
}

fn fixture_pair(dir: &Path, first: (f32, u32), second: (f32, u32)) -> (PathBuf, PathBuf) {
    let path1 = dir.join("reference.wav");
    let path2 = dir.join("clone.wav");
    write_tone_wav(&path1, first.0, first.1, 220.0);
    write_tone_wav(&path2, second.0, second.1, 233.0);
    (path1, path2)
}

#[test]
fn same_rate_pair_renders_all_images_without_resampling() {
    let dir = tempdir().unwrap();
    let (first, second) = fixture_pair(dir.path(), (2.0, 22_050), (3.5, 22_050));
    let spy = Arc::new(SpyResampler::default());
    let comparator = Comparator::new(&settings(&dir.path().join("temp")), spy.clone());

    let prepared = comparator.prepare(&first, &second).unwrap();

    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    assert_eq!(prepared.audio2.original_sample_rate, None);
    assert!(prepared.features1.is_extracted());
    assert!(prepared.features2.is_extracted());
    for path in prepared.images.paths() {
        assert!(path.is_file(), "missing image {}", path.display());
        assert!(path.starts_with(prepared.session.path()));
    }
    let pngs = std::fs::read_dir(prepared.session.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "png"))
        .count();
    assert_eq!(pngs, 7);
    assert!(prepared.analysis_prompt.contains("音频 1 时长: 2.00 秒"));
    assert!(prepared.analysis_prompt.contains("音频 2 时长: 3.50 秒"));
    assert!(
        prepared
            .analysis_prompt
            .contains(&prepared.features1.to_string())
    );
}

#[test]
fn second_signal_is_resampled_to_first_rate() {
    let dir = tempdir().unwrap();
    let (first, second) = fixture_pair(dir.path(), (1.0, 44_100), (1.0, 22_050));
    let spy = Arc::new(SpyResampler::default());
    let comparator = Comparator::new(&settings(&dir.path().join("temp")), spy.clone());

    let prepared = comparator.prepare(&first, &second).unwrap();

    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    assert_eq!(prepared.audio1.sample_rate, 44_100);
    assert_eq!(prepared.audio2.sample_rate, 44_100);
    assert_eq!(prepared.audio2.original_sample_rate, Some(22_050));
    let ratio = prepared.audio2.sample_count as f64 / 22_050.0;
    assert!((ratio - 2.0).abs() < 0.01, "ratio {ratio}");
    assert!((prepared.audio2.duration_seconds - 1.0).abs() < 0.01);
}

#[test]
fn silent_file_yields_near_zero_energy() {
    let dir = tempdir().unwrap();
    let silent = dir.path().join("silence.wav");
    write_test_wav(&silent, &vec![0.0; 16_000], 16_000);
    let comparator = Comparator::with_default_resampler(&settings(&dir.path().join("temp")));

    let prepared = comparator.prepare(&silent, &silent).unwrap();
    let features = prepared.features1.features().unwrap();
    assert!(features.rms_energy_mean.abs() < 1e-6);
    assert!(features.zero_crossing_rate_mean.abs() < 1e-6);
    assert_eq!(features.tempo, 0.0);
}

#[test]
fn concurrent_comparisons_use_distinct_session_directories() {
    let dir = tempdir().unwrap();
    let (first, second) = fixture_pair(dir.path(), (0.5, 16_000), (0.5, 16_000));
    let comparator = Comparator::with_default_resampler(&settings(&dir.path().join("temp")));

    let sessions: Vec<PathBuf> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    comparator
                        .prepare(&first, &second)
                        .unwrap()
                        .session
                        .path()
                        .to_path_buf()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<_> = sessions.iter().collect();
    assert_eq!(unique.len(), sessions.len());
}

#[test]
fn reasoning_receives_analysis_then_improvement_prompt() {
    let dir = tempdir().unwrap();
    let (first, second) = fixture_pair(dir.path(), (2.0, 22_050), (3.5, 22_050));
    let comparator = Comparator::with_default_resampler(&settings(&dir.path().join("temp")));
    let reasoning = RecordingReasoning::default();

    let report = comparator.compare(&first, &second, &reasoning).unwrap();

    let prompts = reasoning.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].0, ANALYSIS_SYSTEM_PROMPT);
    assert!(prompts[0].1.contains("音频 1 时长: 2.00 秒"));
    assert_eq!(prompts[1].0, IMPROVEMENT_SYSTEM_PROMPT);
    assert!(prompts[1].1.contains("answer 1"));
    assert_eq!(report.analysis, "answer 1");
    assert_eq!(report.suggestion, "answer 2");
    assert!(report.render_text().starts_with("AI 分析结果:\nanswer 1\n\n改进建议:\nanswer 2"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["analysis"], "answer 1");
    assert!(json["features1"]["mfcc_mean"].is_array());
    assert!(json["images"]["spectrogram_comparison"].is_string());
}

#[test]
fn unreachable_reasoning_service_keeps_images() {
    let dir = tempdir().unwrap();
    let (first, second) = fixture_pair(dir.path(), (0.5, 16_000), (0.5, 16_000));
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = ChatCompletionsClient::new(
        &ReasoningConfig {
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            base_url: format!("http://{addr}/v1"),
        },
        Duration::from_secs(2),
    );
    let comparator = Comparator::with_default_resampler(&settings(&dir.path().join("temp")));

    let err = comparator.compare(&first, &second, &client).unwrap_err();

    assert!(err.is_upstream());
    assert_eq!(err.stage(), ComparisonStage::Reasoning);
    let session_dir = err.session_dir().unwrap();
    assert!(session_dir.join("waveform_audio1.png").is_file());
    assert!(session_dir.join("spectrogram_comparison.png").is_file());
}

#[test]
fn corrupt_input_fails_at_load_stage() {
    let dir = tempdir().unwrap();
    let bogus = dir.path().join("bogus.wav");
    std::fs::write(&bogus, b"definitely not audio").unwrap();
    let (good, _) = fixture_pair(dir.path(), (0.5, 16_000), (0.5, 16_000));
    let comparator = Comparator::with_default_resampler(&settings(&dir.path().join("temp")));

    let err = comparator.prepare(&good, &bogus).unwrap_err();
    assert_eq!(err.stage(), ComparisonStage::Load);
    assert!(err.to_string().contains("bogus.wav"));
}

#[test]
fn settings_file_in_config_home_sets_output_root() {
    let home = tempdir().unwrap();
    let _guard = ConfigHomeGuard::set(home.path().to_path_buf());
    let config_path = timbrelab::config::config_path().unwrap();
    assert!(config_path.starts_with(home.path().join(".timbrelab")));
    std::fs::write(
        &config_path,
        "output_root = \"sessions\"\nrequest_timeout_secs = 30\n",
    )
    .unwrap();

    let settings = timbrelab::config::load_settings().unwrap();
    assert_eq!(settings.output_root, PathBuf::from("sessions"));
    assert_eq!(settings.request_timeout(), Duration::from_secs(30));
}
