use std::f32::consts::TAU;
use std::path::Path;

/// Write a mono 16-bit WAV holding a two-partial tone.
pub fn write_tone_wav(path: &Path, seconds: f32, sample_rate: u32, frequency: f32) {
    let count = (seconds * sample_rate as f32).round() as usize;
    let samples: Vec<f32> = (0..count)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.4 * (TAU * frequency * t).sin() + 0.1 * (TAU * 2.0 * frequency * t).sin()
        })
        .collect();
    write_test_wav(path, &samples, sample_rate);
}

pub fn write_test_wav(path: &Path, samples: &[f32], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create wav parent dirs");
    }
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav writer");
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).expect("write wav sample");
    }
    writer.finalize().expect("finalize wav");
}
