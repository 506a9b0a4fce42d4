//! Frame-axis averages used to collapse per-frame descriptors into one value.

/// Mean of `values`, accumulated in f64. Empty input yields 0.
pub(crate) fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64) as f32
}

/// Mean of a per-frame descriptor selected by `f`.
pub(crate) fn mean_of<T>(frames: &[T], f: impl Fn(&T) -> f32) -> f32 {
    if frames.is_empty() {
        return 0.0;
    }
    (frames.iter().map(|frame| f(frame) as f64).sum::<f64>() / frames.len() as f64) as f32
}

/// Element-wise mean of fixed-width frames.
pub(crate) fn mean_arrays<const N: usize>(frames: &[[f32; N]]) -> [f32; N] {
    let mut sum = [0.0_f64; N];
    for frame in frames {
        for (acc, &v) in sum.iter_mut().zip(frame) {
            *acc += v as f64;
        }
    }
    let count = frames.len().max(1) as f64;
    sum.map(|v| (v / count) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn means_handle_empty_input() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean_arrays::<3>(&[]), [0.0; 3]);
        assert_eq!(mean_of::<f32>(&[], |v| *v), 0.0);
    }

    #[test]
    fn array_mean_is_per_column() {
        let frames = [[1.0, 2.0], [3.0, 6.0]];
        assert_eq!(mean_arrays(&frames), [2.0, 4.0]);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(mean_of(&frames, |f| f[1]), 4.0);
    }
}
