//! Audio ingestion: decode files to mono at their native rate and align the
//! rates of a comparison pair.

mod decode;
mod downmix;
mod resample;

pub use decode::{AudioDecodeError, load};
pub use resample::{AlignedPair, SignalResampler, SincResampler, align_sample_rates, resample};
