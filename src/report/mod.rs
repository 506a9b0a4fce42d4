//! Comparison assembly: load, align, extract, render, then ask the reasoning
//! service for a verdict and suggestions.

mod comparator;
mod images;
mod session;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::analysis::audio::AudioDecodeError;
use crate::analysis::{AudioSignal, Extraction};
use crate::reasoning::UpstreamServiceError;
use crate::render::RenderError;

pub use comparator::Comparator;
pub use images::{
    CHROMAGRAM_AUDIO1, CHROMAGRAM_AUDIO2, DiagnosticImages, SPECTRAL_CENTROID_AUDIO1,
    SPECTRAL_CENTROID_AUDIO2, SPECTROGRAM_COMPARISON, WAVEFORM_AUDIO1, WAVEFORM_AUDIO2,
};
pub use session::SessionDir;

/// What was loaded for one side of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSummary {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub sample_count: usize,
    /// Rate before conversion, present only when the signal was resampled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_sample_rate: Option<u32>,
}

impl SignalSummary {
    pub(crate) fn new(
        path: &Path,
        signal: &AudioSignal,
        original_sample_rate: Option<u32>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            duration_seconds: signal.duration_seconds(),
            sample_rate: signal.sample_rate(),
            sample_count: signal.sample_count(),
            original_sample_rate,
        }
    }
}

/// Everything up to (not including) the reasoning calls.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedComparison {
    pub audio1: SignalSummary,
    pub audio2: SignalSummary,
    pub features1: Extraction,
    pub features2: Extraction,
    pub images: DiagnosticImages,
    pub session: SessionDir,
    pub analysis_prompt: String,
}

/// A finished comparison with both reasoning answers.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    #[serde(flatten)]
    pub prepared: PreparedComparison,
    pub analysis: String,
    pub suggestion: String,
}

impl PreparedComparison {
    /// Both feature renderings under their headings.
    pub fn features_text(&self) -> String {
        format!(
            "音频 1 特征:\n{}\n\n音频 2 特征:\n{}",
            self.features1, self.features2
        )
    }
}

impl ComparisonReport {
    /// Human readable result block: answers first, then both feature sets.
    pub fn render_text(&self) -> String {
        format!(
            "AI 分析结果:\n{}\n\n改进建议:\n{}\n\n{}",
            self.analysis,
            self.suggestion,
            self.prepared.features_text()
        )
    }
}

/// Pipeline step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStage {
    /// Startup configuration, before any comparison step.
    Config,
    Load,
    Resample,
    Session,
    Render,
    Reasoning,
}

impl ComparisonStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Load => "load",
            Self::Resample => "resample",
            Self::Session => "session",
            Self::Render => "render",
            Self::Reasoning => "reasoning",
        }
    }
}

impl fmt::Display for ComparisonStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comparison that could not produce a report.
#[derive(Debug, Error)]
pub enum ComparisonError {
    /// An input file could not be decoded.
    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        source: AudioDecodeError,
    },
    /// The second signal could not be converted to the first rate.
    #[error("Failed to resample {path}: {source}")]
    Resample {
        path: PathBuf,
        source: AudioDecodeError,
    },
    /// No session directory could be created under the output root.
    #[error("Failed to create session directory under {root}: {source}")]
    Session {
        root: PathBuf,
        source: std::io::Error,
    },
    /// The session directory has already been removed when this is returned.
    #[error("Failed to render {}: {source}", .source.path().display())]
    Render {
        #[from]
        source: RenderError,
    },
    /// Images are already on disk in `session_dir` when this is returned.
    #[error("{source} (images kept in {})", .session_dir.display())]
    Upstream {
        session_dir: PathBuf,
        source: UpstreamServiceError,
    },
}

impl ComparisonError {
    pub fn stage(&self) -> ComparisonStage {
        match self {
            Self::Load { .. } => ComparisonStage::Load,
            Self::Resample { .. } => ComparisonStage::Resample,
            Self::Session { .. } => ComparisonStage::Session,
            Self::Render { .. } => ComparisonStage::Render,
            Self::Upstream { .. } => ComparisonStage::Reasoning,
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    /// Session directory holding images written before the failure.
    pub fn session_dir(&self) -> Option<&Path> {
        match self {
            Self::Upstream { session_dir, .. } => Some(session_dir),
            _ => None,
        }
    }
}

/// Structured failure document: `{"error": {"stage": .., "message": ..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub error: FailureDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    pub stage: ComparisonStage,
    pub message: String,
}

impl FailureReport {
    pub fn new(stage: ComparisonStage, message: impl Into<String>) -> Self {
        Self {
            error: FailureDetail {
                stage,
                message: message.into(),
            },
        }
    }
}

impl From<&ComparisonError> for FailureReport {
    fn from(err: &ComparisonError) -> Self {
        Self::new(err.stage(), err.to_string())
    }
}
