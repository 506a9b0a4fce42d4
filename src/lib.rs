//! Audio timbre comparison: feature extraction, diagnostic plots and a
//! reasoning-service verdict for a pair of recordings.

/// Signal loading, resampling and feature extraction.
pub mod analysis;
/// Application directory resolution.
pub mod app_dirs;
/// Settings file and environment configuration.
pub mod config;
pub(crate) mod http_client;
/// Tracing subscriber setup.
pub mod logging;
/// Prompt construction and the chat completions client.
pub mod reasoning;
/// PNG plots of signals and spectra.
pub mod render;
/// Comparison pipeline and report types.
pub mod report;

pub use analysis::{AudioSignal, Extraction, FeatureVector};
pub use config::{AppSettings, ReasoningConfig};
pub use reasoning::{ChatCompletionsClient, ReasoningService, UpstreamServiceError};
pub use report::{ComparisonError, ComparisonReport, Comparator, PreparedComparison};
