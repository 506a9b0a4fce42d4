/// Pitch classes per chroma frame.
pub const PITCH_CLASS_COUNT: usize = 12;

/// Pitch class names, C first, for plot labels.
pub const PITCH_CLASS_NAMES: [&str; PITCH_CLASS_COUNT] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// C1 in Hz; lower bins carry too little pitch resolution to be useful.
const LOWEST_PITCH_HZ: f64 = 32.703;
const A4_HZ: f64 = 440.0;
const A4_MIDI: f64 = 69.0;

/// Precomputed FFT-bin to pitch-class mapping for one framing.
pub(super) struct ChromaBank {
    classes: Vec<Option<usize>>,
}

impl ChromaBank {
    pub(super) fn new(sample_rate: u32, fft_len: usize) -> Self {
        let fft_len = fft_len.max(2);
        let resolution = sample_rate.max(1) as f64 / fft_len as f64;
        let classes = (0..=fft_len / 2)
            .map(|bin| pitch_class(bin as f64 * resolution))
            .collect();
        Self { classes }
    }

    /// Fold one magnitude frame into pitch-class power, scaled to max 1.
    ///
    /// A frame without energy in any pitch class stays all-zero.
    pub(super) fn chroma_from_magnitudes(&self, magnitudes: &[f32]) -> [f32; PITCH_CLASS_COUNT] {
        let mut energy = [0.0_f64; PITCH_CLASS_COUNT];
        for (class, &mag) in self.classes.iter().zip(magnitudes) {
            if let Some(class) = class {
                energy[*class] += (mag as f64) * (mag as f64);
            }
        }
        let max = energy.iter().copied().fold(0.0_f64, f64::max);
        let mut out = [0.0_f32; PITCH_CLASS_COUNT];
        if max <= 0.0 {
            return out;
        }
        for (slot, value) in out.iter_mut().zip(energy) {
            *slot = (value / max) as f32;
        }
        out
    }
}

fn pitch_class(freq_hz: f64) -> Option<usize> {
    if freq_hz < LOWEST_PITCH_HZ {
        return None;
    }
    let midi = A4_MIDI + 12.0 * (freq_hz / A4_HZ).log2();
    Some((midi.round() as i64).rem_euclid(PITCH_CLASS_COUNT as i64) as usize)
}
