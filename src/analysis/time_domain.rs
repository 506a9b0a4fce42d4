//! Framewise time-domain descriptors sharing the STFT framing.

/// Per-frame zero-crossing rate over centered frames.
///
/// Frames are edge-padded at the signal boundaries. A crossing is counted
/// between adjacent samples whose signs differ, with 0 treated as positive;
/// the rate divides by the frame length.
pub(crate) fn zero_crossing_rates(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<f32> {
    let frame_size = frame_size.max(1);
    framed(samples, frame_size, hop_size, Padding::Edge, |frame| {
        let crossings = frame
            .windows(2)
            .filter(|pair| is_negative(pair[0]) != is_negative(pair[1]))
            .count();
        crossings as f32 / frame_size as f32
    })
}

/// Per-frame root-mean-square energy over centered, zero-padded frames.
pub(crate) fn rms_frames(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<f32> {
    framed(samples, frame_size, hop_size, Padding::Zero, |frame| {
        let sum: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum / frame.len().max(1) as f64).sqrt() as f32
    })
}

#[derive(Clone, Copy)]
enum Padding {
    Zero,
    Edge,
}

fn is_negative(sample: f32) -> bool {
    sample < 0.0
}

fn framed(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
    padding: Padding,
    mut reduce: impl FnMut(&[f32]) -> f32,
) -> Vec<f32> {
    let frame_size = frame_size.max(1);
    let hop_size = hop_size.max(1);
    let pad = frame_size / 2;
    let frame_count = 1 + samples.len() / hop_size;
    let mut frame = vec![0.0_f32; frame_size];
    let mut out = Vec::with_capacity(frame_count);
    for index in 0..frame_count {
        let start = index * hop_size;
        for (i, cell) in frame.iter_mut().enumerate() {
            *cell = padded_sample(samples, (start + i) as isize - pad as isize, padding);
        }
        out.push(reduce(&frame));
    }
    out
}

fn padded_sample(samples: &[f32], position: isize, padding: Padding) -> f32 {
    let Some(last) = samples.len().checked_sub(1) else {
        return 0.0;
    };
    let sample = if position < 0 {
        match padding {
            Padding::Zero => 0.0,
            Padding::Edge => samples[0],
        }
    } else if position as usize > last {
        match padding {
            Padding::Zero => 0.0,
            Padding::Edge => samples[last],
        }
    } else {
        samples[position as usize]
    };
    sanitize_sample(sample)
}

fn sanitize_sample(sample: f32) -> f32 {
    if sample.is_finite() { sample } else { 0.0 }
}
