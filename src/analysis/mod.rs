//! Signal loading, resampling and acoustic feature extraction.

pub mod audio;
pub mod features;
pub(crate) mod fft;
pub mod frequency_domain;
mod signal;
pub(crate) mod tempo;
pub(crate) mod time_domain;

pub use features::{Extraction, FeatureExtractionError, FeatureVector, extract};
pub use signal::{AudioSignal, InvalidSignal};
