use super::canvas::{BLACK, Canvas, GRID};
use super::font::{text_height, text_width};

pub(super) const TICK_SCALE: u32 = 2;
pub(super) const LABEL_SCALE: u32 = 2;
const TICK_LENGTH: i64 = 6;
const TARGET_TICKS: usize = 6;

/// Pixel rectangle the data is drawn into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct PlotArea {
    pub(super) left: u32,
    pub(super) top: u32,
    pub(super) width: u32,
    pub(super) height: u32,
}

impl PlotArea {
    pub(super) fn right(&self) -> u32 {
        self.left + self.width.saturating_sub(1)
    }

    pub(super) fn bottom(&self) -> u32 {
        self.top + self.height.saturating_sub(1)
    }

    /// Pixel column for a fraction of the width.
    pub(super) fn x_at(&self, fraction: f64) -> i64 {
        self.left as i64 + (fraction * self.width.saturating_sub(1) as f64).round() as i64
    }

    /// Pixel row for a fraction of the height, 0 at the bottom.
    pub(super) fn y_at(&self, fraction: f64) -> i64 {
        self.bottom() as i64 - (fraction * self.height.saturating_sub(1) as f64).round() as i64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Scale {
    Linear,
    Log,
}

/// Value range of one plot axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Axis {
    pub(super) min: f64,
    pub(super) max: f64,
    pub(super) scale: Scale,
}

impl Axis {
    pub(super) fn linear(min: f64, max: f64) -> Self {
        let (min, max) = widen(min, max);
        Self {
            min,
            max,
            scale: Scale::Linear,
        }
    }

    /// Logarithmic axis; bounds are forced positive.
    pub(super) fn log(min: f64, max: f64) -> Self {
        let min = min.max(f64::MIN_POSITIVE);
        let max = max.max(min * 10.0_f64.powf(0.1));
        Self {
            min,
            max,
            scale: Scale::Log,
        }
    }

    /// Position of `value` as a fraction of the axis span.
    pub(super) fn fraction(&self, value: f64) -> f64 {
        match self.scale {
            Scale::Linear => (value - self.min) / (self.max - self.min),
            Scale::Log => {
                let value = value.max(f64::MIN_POSITIVE);
                (value.ln() - self.min.ln()) / (self.max.ln() - self.min.ln())
            }
        }
    }

    /// Inverse of [`Axis::fraction`].
    pub(super) fn value_at(&self, fraction: f64) -> f64 {
        match self.scale {
            Scale::Linear => self.min + fraction * (self.max - self.min),
            Scale::Log => (self.min.ln() + fraction * (self.max.ln() - self.min.ln())).exp(),
        }
    }

    pub(super) fn ticks(&self) -> Vec<(f64, String)> {
        match self.scale {
            Scale::Linear => linear_ticks(self.min, self.max, TARGET_TICKS),
            Scale::Log => log_ticks(self.min, self.max),
        }
    }
}

fn widen(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if max - min > f64::EPSILON * max.abs().max(1.0) {
        return (min, max);
    }
    let pad = (min.abs() * 0.05).max(0.5);
    (min - pad, max + pad)
}

/// Step of 1, 2, 5 or 10 times a power of ten giving about `target` ticks.
pub(super) fn nice_step(span: f64, target: usize) -> f64 {
    let raw = span.abs() / target.max(1) as f64;
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10.0_f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized < 1.5 {
        1.0
    } else if normalized < 3.0 {
        2.0
    } else if normalized < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn linear_ticks(min: f64, max: f64, target: usize) -> Vec<(f64, String)> {
    let step = nice_step(max - min, target);
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last)
        .map(|i| {
            let value = i as f64 * step;
            // Avoid printing "-0".
            let value = if value.abs() < step * 1e-9 { 0.0 } else { value };
            (value, format!("{value:.decimals$}"))
        })
        .collect()
}

fn log_ticks(min: f64, max: f64) -> Vec<(f64, String)> {
    let first = min.log10().floor() as i32;
    let last = max.log10().ceil() as i32;
    let decades = (last - first).max(1);
    let multiples: &[f64] = if decades <= 2 { &[1.0, 2.0, 5.0] } else { &[1.0] };
    let mut ticks = Vec::new();
    for exponent in first..=last {
        let base = 10.0_f64.powi(exponent);
        for multiple in multiples {
            let value = base * multiple;
            if value >= min * (1.0 - 1e-9) && value <= max * (1.0 + 1e-9) {
                let decimals = if value >= 1.0 { 0 } else { (-exponent) as usize };
                ticks.push((value, format!("{value:.decimals$}")));
            }
        }
    }
    ticks
}

/// Frame, grid, tick marks and axis labels around `area`.
pub(super) fn draw_axes(
    canvas: &mut Canvas,
    area: PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    x_label: &str,
    y_label: &str,
    grid: bool,
) {
    draw_x_axis(canvas, area, x_axis, grid);
    let widest_y_tick = draw_y_axis(canvas, area, y_axis, grid);
    draw_labels(canvas, area, x_label, y_label, widest_y_tick);
    canvas.stroke_rect(area.left as i64, area.top as i64, area.width, area.height, BLACK);
}

/// Tick marks and labels below `area`, with optional vertical grid lines.
pub(super) fn draw_x_axis(canvas: &mut Canvas, area: PlotArea, axis: &Axis, grid: bool) {
    for (value, label) in axis.ticks() {
        let x = area.x_at(axis.fraction(value));
        if grid {
            canvas.vline(x, area.top as i64, area.bottom() as i64, GRID);
        }
        canvas.vline(x, area.bottom() as i64, area.bottom() as i64 + TICK_LENGTH, BLACK);
        let width = text_width(&label, TICK_SCALE) as i64;
        canvas.text(
            x - width / 2,
            area.bottom() as i64 + TICK_LENGTH + 4,
            &label,
            TICK_SCALE,
            BLACK,
        );
    }
}

/// Tick marks and labels left of `area`. Returns the widest label in pixels.
pub(super) fn draw_y_axis(canvas: &mut Canvas, area: PlotArea, axis: &Axis, grid: bool) -> u32 {
    let tick_height = text_height(TICK_SCALE) as i64;
    let mut widest = 0u32;
    for (value, label) in axis.ticks() {
        let y = area.y_at(axis.fraction(value));
        if grid {
            canvas.hline(area.left as i64, area.right() as i64, y, GRID);
        }
        canvas.hline(area.left as i64 - TICK_LENGTH, area.left as i64, y, BLACK);
        let width = text_width(&label, TICK_SCALE);
        widest = widest.max(width);
        canvas.text(
            area.left as i64 - TICK_LENGTH - 4 - width as i64,
            y - tick_height / 2,
            &label,
            TICK_SCALE,
            BLACK,
        );
    }
    widest
}

/// Category ticks on the y axis, first label at the bottom row. Returns the
/// widest label in pixels.
pub(super) fn draw_category_axis(canvas: &mut Canvas, area: PlotArea, labels: &[&str]) -> u32 {
    let rows = labels.len().max(1) as f64;
    let tick_height = text_height(TICK_SCALE) as i64;
    let mut widest = 0u32;
    for (row, label) in labels.iter().enumerate() {
        let y = area.y_at((row as f64 + 0.5) / rows);
        canvas.hline(area.left as i64 - TICK_LENGTH, area.left as i64, y, BLACK);
        let width = text_width(label, TICK_SCALE);
        widest = widest.max(width);
        canvas.text(
            area.left as i64 - TICK_LENGTH - 4 - width as i64,
            y - tick_height / 2,
            label,
            TICK_SCALE,
            BLACK,
        );
    }
    widest
}

/// X label centered below the tick labels and Y label rotated left of them.
pub(super) fn draw_labels(
    canvas: &mut Canvas,
    area: PlotArea,
    x_label: &str,
    y_label: &str,
    y_tick_width: u32,
) {
    let tick_height = text_height(TICK_SCALE) as i64;
    if !x_label.is_empty() {
        let width = text_width(x_label, LABEL_SCALE) as i64;
        let center = area.left as i64 + area.width as i64 / 2;
        canvas.text(
            center - width / 2,
            area.bottom() as i64 + TICK_LENGTH + 4 + tick_height + 10,
            x_label,
            LABEL_SCALE,
            BLACK,
        );
    }
    if !y_label.is_empty() {
        let length = text_width(y_label, LABEL_SCALE) as i64;
        let middle = area.top as i64 + area.height as i64 / 2;
        let x = area.left as i64
            - TICK_LENGTH
            - 4
            - y_tick_width as i64
            - 10
            - text_height(LABEL_SCALE) as i64;
        canvas.text_vertical(x, middle - length / 2, y_label, LABEL_SCALE, BLACK);
    }
}
