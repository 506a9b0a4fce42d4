//! PNG diagnostics: waveform, spectral centroid, chromagram and a paired
//! spectrogram comparison.

mod axes;
mod canvas;
mod colormap;
mod font;
mod plots;

use std::path::PathBuf;

use thiserror::Error;

pub use plots::{
    plot_chromagram, plot_spectral_centroid, plot_spectrogram_comparison, plot_waveform,
};

/// Size of the single-signal plots.
pub const PLOT_SIZE: (u32, u32) = (1000, 400);
/// Size of the two-panel spectrogram comparison.
pub const COMPARISON_SIZE: (u32, u32) = (1200, 800);

/// Failure to write a diagnostic image. No partial file is left behind.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing or renaming the image file failed.
    #[error("Failed to move rendered image into {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// PNG encoding failed.
    #[error("Failed to encode image {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

impl RenderError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            RenderError::Io { path, .. } | RenderError::Encode { path, .. } => path,
        }
    }
}
