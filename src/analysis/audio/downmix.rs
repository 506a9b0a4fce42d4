/// Append the mono mix of interleaved `samples` to `out`.
///
/// Each frame is the mean of its channels. Trailing partial frames are dropped.
pub(super) fn downmix_to_mono(out: &mut Vec<f32>, samples: &[f32], channels: usize) {
    let channels = channels.max(1);
    if channels == 1 {
        out.reserve(samples.len());
        out.extend(samples.iter().copied().map(sanitize_sample));
        return;
    }
    let frames = samples.len() / channels;
    out.reserve(frames);
    for frame in samples.chunks_exact(channels) {
        let sum: f32 = frame.iter().copied().map(sanitize_sample).sum();
        out.push(sum / channels as f32);
    }
}

fn sanitize_sample(sample: f32) -> f32 {
    if !sample.is_finite() {
        return 0.0;
    }
    if sample != 0.0 && sample.abs() < f32::MIN_POSITIVE {
        0.0
    } else {
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_frames_average_into_mono() {
        let mut out = Vec::new();
        downmix_to_mono(&mut out, &[0.5, -0.5, 1.0, 0.0, 0.25], 2);
        assert_eq!(out, vec![0.0, 0.5]);
    }

    #[test]
    fn mono_input_is_sanitized_and_appended() {
        let mut out = vec![0.1];
        downmix_to_mono(&mut out, &[f32::NAN, f32::INFINITY, 1e-40, -0.3], 1);
        assert_eq!(out, vec![0.1, 0.0, 0.0, 0.0, -0.3]);
    }

    #[test]
    fn samples_above_full_scale_pass_through() {
        let mut out = Vec::new();
        downmix_to_mono(&mut out, &[2.0, -1.5, 3.0, 1.0], 2);
        assert_eq!(out, vec![0.25, 2.0]);
    }
}
