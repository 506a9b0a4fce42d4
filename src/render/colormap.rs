use image::Rgb;

/// Perceptually uniform colormaps sampled at nine evenly spaced anchors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Colormap {
    Viridis,
    Magma,
}

const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [71, 44, 122],
    [59, 81, 139],
    [44, 113, 142],
    [33, 144, 141],
    [39, 173, 129],
    [92, 200, 99],
    [170, 220, 50],
    [253, 231, 37],
];

const MAGMA: [[u8; 3]; 9] = [
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

impl Colormap {
    fn anchors(self) -> &'static [[u8; 3]; 9] {
        match self {
            Colormap::Viridis => &VIRIDIS,
            Colormap::Magma => &MAGMA,
        }
    }

    /// Color for `t` in `[0, 1]`; values outside are clamped, NaN maps to 0.
    pub(super) fn color(self, t: f32) -> Rgb<u8> {
        let anchors = self.anchors();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (anchors.len() - 1) as f32;
        let lower = (scaled.floor() as usize).min(anchors.len() - 2);
        let frac = scaled - lower as f32;
        let (a, b) = (anchors[lower], anchors[lower + 1]);
        Rgb(std::array::from_fn(|i| {
            (a[i] as f32 + (b[i] as f32 - a[i] as f32) * frac).round() as u8
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_hit_the_anchors() {
        assert_eq!(Colormap::Viridis.color(0.0), Rgb([68, 1, 84]));
        assert_eq!(Colormap::Viridis.color(1.0), Rgb([253, 231, 37]));
        assert_eq!(Colormap::Magma.color(-3.0), Rgb([0, 0, 4]));
        assert_eq!(Colormap::Magma.color(f32::NAN), Rgb([0, 0, 4]));
    }

    #[test]
    fn midpoints_interpolate_between_anchors() {
        assert_eq!(Colormap::Viridis.color(0.5), Rgb([33, 144, 141]));
        let between = Colormap::Magma.color(1.0 / 16.0);
        assert_eq!(between, Rgb([14, 8, 36]));
    }
}
